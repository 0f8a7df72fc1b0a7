//! tests/support.rs
//! Fakes compartidos: reloj fijo, timer que registra, composer guionado, store que cuenta escrituras.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::{mpsc, Notify};

use crate::error::{MailerError, MailerResult};
use crate::models::message_model::MessageRequest;
use crate::models::sequencer_model::SequencerState;
use crate::models::settings_model::Settings;
use crate::services::campaign_service::CampaignService;
use crate::services::composer_service::{ComposeOutcome, Composer};
use crate::services::enhancer_service::{EnhanceContext, TextEnhancer};
use crate::services::log_service::LogService;
use crate::services::quota_service::QuotaService;
use crate::services::sequencer_service::Sequencer;
use crate::services::state_store::{self, MemoryStateStore, StateStore};
use crate::services::timing::{Clock, Timer};

pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set_today(&self, today: NaiveDate) {
        *self.today.lock().unwrap() = today;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let today = *self.today.lock().unwrap();
        Utc.from_utc_datetime(&today.and_hms_opt(9, 30, 0).unwrap())
    }

    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap()
    }
}

/// No duerme: registra la duración y cede el turno.
#[derive(Default)]
pub struct RecordingTimer {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingTimer {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Timer for RecordingTimer {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Nunca despierta: sólo una pausa puede sacar al driver de la espera.
#[derive(Default)]
pub struct HangingTimer {
    sleeps: AtomicUsize,
}

impl HangingTimer {
    pub fn sleeps(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Timer for HangingTimer {
    async fn sleep(&self, _duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
    }
}

/// Composer que falla en las llamadas indicadas (1-based) y puede
/// quedarse bloqueado en una llamada hasta que el test lo libere.
#[derive(Default)]
pub struct ScriptedComposer {
    calls: Mutex<Vec<MessageRequest>>,
    fail_on: Vec<usize>,
    gate: Option<(usize, Arc<Notify>)>,
    started_tx: Option<mpsc::UnboundedSender<usize>>,
}

impl ScriptedComposer {
    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_on: calls.to_vec(),
            ..Default::default()
        }
    }

    /// Bloquea la llamada `call` hasta `release.notify_one()`. Cada llamada
    /// avisa su número por el canal devuelto.
    pub fn gated_on(call: usize, release: Arc<Notify>) -> (Self, mpsc::UnboundedReceiver<usize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let composer = Self {
            gate: Some((call, release)),
            started_tx: Some(tx),
            ..Default::default()
        };
        (composer, rx)
    }

    pub fn calls(&self) -> Vec<MessageRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Composer for ScriptedComposer {
    async fn compose(
        &self,
        msg: &MessageRequest,
        _settings: &Settings,
    ) -> MailerResult<ComposeOutcome> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(msg.clone());
            calls.len()
        };
        if let Some(tx) = &self.started_tx {
            let _ = tx.send(n);
        }
        if let Some((gated, release)) = &self.gate {
            if *gated == n {
                release.notified().await;
            }
        }
        if self.fail_on.contains(&n) {
            return Err(MailerError::FieldNotFound("to".to_string()));
        }
        Ok(ComposeOutcome::Submitted)
    }
}

/// Marca los cuerpos para verificar que pasaron por el enhancer.
pub struct TaggingEnhancer;

#[async_trait]
impl TextEnhancer for TaggingEnhancer {
    async fn enhance(&self, text: &str, ctx: &EnhanceContext, _api_key: &str) -> String {
        format!("[{}] {}", ctx.company, text)
    }
}

/// Envuelve un MemoryStateStore y cuenta las llamadas a `set`.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStateStore,
    sets: AtomicUsize,
}

impl CountingStore {
    pub fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for CountingStore {
    async fn get(&self, keys: &[&str]) -> MailerResult<HashMap<String, Value>> {
        self.inner.get(keys).await
    }

    async fn set(&self, values: HashMap<String, Value>) -> MailerResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(values).await
    }
}

pub fn message(n: usize) -> MessageRequest {
    MessageRequest {
        to: format!("recruiter{}@example.com", n),
        subject: format!("Application {}", n),
        body: format!("Hello recruiter {}", n),
        company: format!("Company{}", n),
        role: "Backend Engineer".to_string(),
    }
}

pub fn queue_of(n: usize) -> VecDeque<MessageRequest> {
    (1..=n).map(message).collect()
}

pub struct Harness {
    pub store: Arc<dyn StateStore>,
    pub clock: Arc<FixedClock>,
    pub timer: Arc<RecordingTimer>,
    pub composer: Arc<ScriptedComposer>,
    pub log_service: LogService,
    pub quota: QuotaService,
    pub sequencer: Sequencer,
}

impl Harness {
    pub fn new(composer: ScriptedComposer) -> Self {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
        let clock = Arc::new(FixedClock::new(day(2026, 10, 16)));
        let timer = Arc::new(RecordingTimer::default());
        let composer = Arc::new(composer);
        let log_service = LogService::new(store.clone(), clock.clone());
        let quota = QuotaService::new(store.clone(), clock.clone());
        let sequencer = Sequencer::new(
            store.clone(),
            composer.clone(),
            log_service.clone(),
            timer.clone(),
            ERROR_BACKOFF,
        );
        Self {
            store,
            clock,
            timer,
            composer,
            log_service,
            quota,
            sequencer,
        }
    }

    pub async fn with_settings(self, settings: Settings) -> Self {
        state_store::save_settings(self.store.as_ref(), &settings)
            .await
            .unwrap();
        self
    }

    pub fn campaign(&self, enhancer: Arc<dyn TextEnhancer>) -> CampaignService {
        CampaignService::new(
            self.store.clone(),
            self.quota.clone(),
            enhancer,
            self.sequencer.clone(),
        )
    }

    pub async fn wait_for(&self, state: SequencerState) {
        tokio::time::timeout(
            Duration::from_secs(5),
            self.sequencer.wait_until(|s| s == state),
        )
        .await
        .unwrap_or_else(|_| panic!("sequencer never reached {:?}", state));
    }
}

//! services/sequencer_service.rs
//! Secuenciador de envíos: saca un mensaje de la cola, llama al composer,
//! registra el resultado y espera un intervalo aleatorio antes del siguiente.
//!
//! Nunca hay más de un mensaje en vuelo. `pause()` no cancela el mensaje
//! actual; corta la espera entre envíos e impide que arranque el siguiente.
//! El último mensaje cierra la corrida sin espera posterior.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{broadcast, watch, Mutex, Notify};

use crate::{
    error::{MailerError, MailerResult},
    models::{
        log_model::SendStatus,
        message_model::MessageRequest,
        sequencer_model::{SequencerEvent, SequencerState, SequencerStatus},
        settings_model::Settings,
    },
    services::{
        composer_service::{ComposeOutcome, Composer},
        log_service::LogService,
        state_store::{self, StateStore},
        timing::Timer,
    },
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
struct RunState {
    queue: VecDeque<MessageRequest>,
    state: SequencerState,
    pause_requested: bool,
    /// Hay una tarea `drive` viva (posiblemente dormida entre envíos)
    driver_active: bool,
    last_event: Option<SequencerEvent>,
}

#[derive(Clone)]
pub struct Sequencer {
    run: Arc<Mutex<RunState>>,
    store: Arc<dyn StateStore>,
    composer: Arc<dyn Composer>,
    log_service: LogService,
    timer: Arc<dyn Timer>,
    error_backoff: Duration,
    events: broadcast::Sender<SequencerEvent>,
    state_tx: Arc<watch::Sender<SequencerState>>,
    /// Despierta al driver si está dormido entre envíos
    pause_signal: Arc<Notify>,
}

impl Sequencer {
    pub fn new(
        store: Arc<dyn StateStore>,
        composer: Arc<dyn Composer>,
        log_service: LogService,
        timer: Arc<dyn Timer>,
        error_backoff: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (state_tx, _) = watch::channel(SequencerState::Idle);
        Self {
            run: Arc::new(Mutex::new(RunState {
                queue: VecDeque::new(),
                state: SequencerState::Idle,
                pause_requested: false,
                driver_active: false,
                last_event: None,
            })),
            store,
            composer,
            log_service,
            timer,
            error_backoff,
            events,
            state_tx: Arc::new(state_tx),
            pause_signal: Arc::new(Notify::new()),
        }
    }

    /// Reemplaza la cola y arranca. Se rechaza si ya hay un envío en curso.
    pub async fn start(&self, queue: VecDeque<MessageRequest>) -> MailerResult<()> {
        if queue.is_empty() {
            return Err(MailerError::EmptyQueue);
        }

        let mut run = self.run.lock().await;
        if run.driver_active {
            log::warn!("start() ignorado: ya hay una secuencia en curso");
            return Err(MailerError::AlreadyRunning);
        }

        log::info!("Iniciando secuencia de {} mensajes", queue.len());
        run.queue = queue;
        run.pause_requested = false;
        run.last_event = None;
        self.spawn_driver(&mut run);
        Ok(())
    }

    pub async fn pause(&self) -> SequencerState {
        let mut run = self.run.lock().await;
        if run.driver_active {
            log::info!("Pausa solicitada, {} mensajes pendientes", run.queue.len());
            run.pause_requested = true;
            self.pause_signal.notify_waiters();
        }
        run.state
    }

    pub async fn resume(&self) -> SequencerState {
        let mut run = self.run.lock().await;
        run.pause_requested = false;

        if run.driver_active {
            // Seguía dormido entre envíos: continúa solo
            return run.state;
        }
        if run.queue.is_empty() {
            self.set_state(&mut run, SequencerState::Idle);
            return run.state;
        }

        log::info!("Reanudando secuencia, {} mensajes pendientes", run.queue.len());
        self.spawn_driver(&mut run);
        run.state
    }

    pub async fn status(&self) -> SequencerStatus {
        let run = self.run.lock().await;
        SequencerStatus {
            state: run.state,
            remaining: run.queue.len(),
            pause_requested: run.pause_requested,
            last_event: run.last_event.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequencerEvent> {
        self.events.subscribe()
    }

    /// Espera hasta que el estado cumpla `pred`.
    #[cfg(test)]
    pub async fn wait_until<F>(&self, pred: F)
    where
        F: Fn(SequencerState) -> bool,
    {
        let mut rx = self.state_tx.subscribe();
        loop {
            if pred(*rx.borrow_and_update()) {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    fn spawn_driver(&self, run: &mut RunState) {
        run.driver_active = true;
        self.set_state(run, SequencerState::Running);
        let sequencer = self.clone();
        tokio::spawn(async move { sequencer.drive().await });
    }

    fn set_state(&self, run: &mut RunState, state: SequencerState) {
        run.state = state;
        self.state_tx.send_replace(state);
    }

    async fn publish(&self, event: SequencerEvent) {
        self.run.lock().await.last_event = Some(event.clone());
        // Sin suscriptores el send falla; no importa
        let _ = self.events.send(event);
    }

    /// Cierra la corrida si no queda nada o si hay una pausa pedida.
    /// Cola vacía gana: la corrida terminó aunque se haya pedido pausa.
    fn stop_point(&self, run: &mut RunState) -> Option<SequencerEvent> {
        let (state, event) = if run.queue.is_empty() {
            (SequencerState::Idle, SequencerEvent::Finished)
        } else if run.pause_requested {
            (
                SequencerState::Paused,
                SequencerEvent::Paused {
                    remaining: run.queue.len(),
                },
            )
        } else {
            return None;
        };

        run.driver_active = false;
        run.last_event = Some(event.clone());
        self.set_state(run, state);
        Some(event)
    }

    fn announce_stop(&self, event: SequencerEvent) {
        log::info!("Secuencia detenida: {:?}", event);
        let _ = self.events.send(event);
    }

    /// Bucle principal. Una iteración = un mensaje + su espera.
    async fn drive(self) {
        loop {
            let next = {
                let mut run = self.run.lock().await;
                match self.stop_point(&mut run) {
                    Some(event) => Err(event),
                    None => match run.queue.pop_front() {
                        Some(msg) => {
                            self.set_state(&mut run, SequencerState::Running);
                            Ok(msg)
                        }
                        None => Err(SequencerEvent::Finished),
                    },
                }
            };
            let msg = match next {
                Ok(msg) => msg,
                Err(event) => return self.announce_stop(event),
            };

            let wait = self.process(&msg).await;

            // Se registra antes de mirar el flag para no perder una pausa
            // que llegue entre el chequeo y el select
            let paused = self.pause_signal.notified();
            tokio::pin!(paused);
            paused.as_mut().enable();

            let stopped = {
                let mut run = self.run.lock().await;
                self.stop_point(&mut run)
            };
            if let Some(event) = stopped {
                return self.announce_stop(event);
            }

            let sleep = self.timer.sleep(wait);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    _ = &mut paused => {
                        paused.set(self.pause_signal.notified());
                        paused.as_mut().enable();
                        // pause() seguido de resume() no acorta la espera
                        if self.run.lock().await.pause_requested {
                            log::info!("Pausa recibida durante la espera");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Procesa un mensaje y devuelve cuánto esperar antes del siguiente.
    async fn process(&self, msg: &MessageRequest) -> Duration {
        let settings = match state_store::load_settings(self.store.as_ref()).await {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("No se pudieron leer settings, usando valores por defecto: {}", e);
                Settings::default()
            }
        };

        match self.composer.compose(msg, &settings).await {
            Ok(outcome) => {
                if let ComposeOutcome::Drafted(path) = &outcome {
                    log::info!("Borrador para {} listo en {:?}", msg.to, path);
                }
                if let Err(e) = self.log_service.record(msg, SendStatus::Sent, None).await {
                    log::error!("Email to {} composed but could not be logged: {}", msg.to, e);
                }

                let delay = next_delay_seconds(&settings);
                let remaining = self.run.lock().await.queue.len();
                log::info!(
                    "Enviado a {}. Restantes: {}, siguiente en {}s",
                    msg.to,
                    remaining,
                    delay
                );
                self.publish(SequencerEvent::Progress {
                    remaining,
                    next_delay_seconds: delay,
                })
                .await;
                Duration::from_secs(delay)
            }
            Err(e) => {
                log::error!("Error enviando a {}: {}", msg.to, e);
                if let Err(log_err) = self
                    .log_service
                    .record(msg, SendStatus::Failed, Some(e.to_string()))
                    .await
                {
                    log::error!("No se pudo registrar el fallo de {}: {}", msg.to, log_err);
                }

                {
                    let mut run = self.run.lock().await;
                    self.set_state(&mut run, SequencerState::DrainingOnError);
                }
                self.publish(SequencerEvent::Failed {
                    recipient: msg.to.clone(),
                    error_message: e.to_string(),
                })
                .await;
                self.error_backoff
            }
        }
    }
}

/// Uniforme en [min_delay_seconds, max_delay_seconds].
pub fn next_delay_seconds(settings: &Settings) -> u64 {
    let min = settings.min_delay_seconds.min(settings.max_delay_seconds);
    let max = settings.max_delay_seconds.max(settings.min_delay_seconds);
    rand::thread_rng().gen_range(min..=max)
}

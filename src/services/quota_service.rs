//! services/quota_service.rs
//! Contador diario de envíos con reset al cambiar el día.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{MailerError, MailerResult},
    models::stats_model::Stats,
    services::{
        state_store::{self, StateStore, STATS_KEY},
        timing::Clock,
    },
};

#[derive(Clone)]
pub struct QuotaService {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl QuotaService {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Idempotente: sólo escribe cuando `last_reset_date` no es hoy.
    pub async fn check_and_reset(&self) -> MailerResult<Stats> {
        let today = self.clock.today();
        let mut stats = state_store::load_stats(self.store.as_ref(), today).await?;

        if stats.roll_over(today) {
            self.store
                .set(HashMap::from([state_store::entry(STATS_KEY, &stats)?]))
                .await?;
            log::info!("Contador diario reiniciado ({})", today);
        }
        Ok(stats)
    }

    /// today_sent < daily_limit. No modifica nada.
    pub async fn can_send(&self) -> MailerResult<bool> {
        let (stats, limit) = self.snapshot().await?;
        Ok(stats.today_sent < limit)
    }

    pub async fn ensure_can_send(&self) -> MailerResult<()> {
        let (stats, limit) = self.snapshot().await?;
        if stats.today_sent >= limit {
            return Err(MailerError::QuotaExceeded {
                sent: stats.today_sent,
                limit,
            });
        }
        Ok(())
    }

    async fn snapshot(&self) -> MailerResult<(Stats, u32)> {
        let settings = state_store::load_settings(self.store.as_ref()).await?;
        let stats = state_store::load_stats(self.store.as_ref(), self.clock.today()).await?;
        Ok((stats, settings.daily_limit))
    }

    /// Lanza la revisión periódica en background.
    pub fn spawn_periodic_reset(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let quota = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Err(e) = quota.check_and_reset().await {
                    log::error!("Error en reset diario: {}", e);
                }
            }
        })
    }
}

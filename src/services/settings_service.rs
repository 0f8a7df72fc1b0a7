//! services/settings_service.rs

use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::MailerResult,
    models::settings_model::{Settings, UpdateSettingsRequest},
    services::state_store::{self, StateStore},
};

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn StateStore>,
    error_backoff: Duration,
}

impl SettingsService {
    pub fn new(store: Arc<dyn StateStore>, error_backoff: Duration) -> Self {
        Self {
            store,
            error_backoff,
        }
    }

    pub async fn get(&self) -> MailerResult<Settings> {
        state_store::load_settings(self.store.as_ref()).await
    }

    /// Update parcial; se valida antes de persistir.
    pub async fn update(&self, update: UpdateSettingsRequest) -> MailerResult<Settings> {
        let current = self.get().await?;
        let next = current.apply(update);
        next.validate(self.error_backoff)?;
        state_store::save_settings(self.store.as_ref(), &next).await?;
        log::info!("Settings guardadas: {:?}", next);
        Ok(next)
    }
}

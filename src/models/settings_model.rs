//! models/settings_model.rs
//! Settings del operador, persistidas en el store bajo la clave "settings".

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MailerError, MailerResult};

/// Lo que ve el cliente en lugar del api_key real
pub const API_KEY_MASK: &str = "********";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub daily_limit: u32,
    pub min_delay_seconds: u64,
    pub max_delay_seconds: u64,
    /// Si es true el composer deja el mensaje como borrador en vez de enviarlo
    pub require_manual_review: bool,
    pub ai_enabled: bool,
    pub api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            daily_limit: 20,
            min_delay_seconds: 30,
            max_delay_seconds: 60,
            require_manual_review: true,
            ai_enabled: false,
            api_key: String::new(),
        }
    }
}

// El api_key nunca debe terminar en los logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("daily_limit", &self.daily_limit)
            .field("min_delay_seconds", &self.min_delay_seconds)
            .field("max_delay_seconds", &self.max_delay_seconds)
            .field("require_manual_review", &self.require_manual_review)
            .field("ai_enabled", &self.ai_enabled)
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

impl Settings {
    /// El delay mínimo entre envíos tiene que superar el backoff tras un fallo.
    pub fn validate(&self, error_backoff: Duration) -> MailerResult<()> {
        if self.daily_limit == 0 {
            return Err(MailerError::InvalidSettings(
                "daily_limit must be greater than zero".to_string(),
            ));
        }
        if Duration::from_secs(self.min_delay_seconds) <= error_backoff {
            return Err(MailerError::InvalidSettings(format!(
                "min_delay_seconds ({}) must be greater than the error backoff ({}s)",
                self.min_delay_seconds,
                error_backoff.as_secs()
            )));
        }
        if self.min_delay_seconds > self.max_delay_seconds {
            return Err(MailerError::InvalidSettings(format!(
                "min_delay_seconds ({}) is greater than max_delay_seconds ({})",
                self.min_delay_seconds, self.max_delay_seconds
            )));
        }
        Ok(())
    }

    /// Aplica un update parcial. Los campos ausentes conservan su valor.
    pub fn apply(&self, update: UpdateSettingsRequest) -> Settings {
        Settings {
            daily_limit: update.daily_limit.unwrap_or(self.daily_limit),
            min_delay_seconds: update.min_delay_seconds.unwrap_or(self.min_delay_seconds),
            max_delay_seconds: update.max_delay_seconds.unwrap_or(self.max_delay_seconds),
            require_manual_review: update
                .require_manual_review
                .unwrap_or(self.require_manual_review),
            ai_enabled: update.ai_enabled.unwrap_or(self.ai_enabled),
            // Un GET seguido de PUT devuelve la máscara; no pisa el secreto
            api_key: match update.api_key {
                Some(key) if key != API_KEY_MASK => key,
                _ => self.api_key.clone(),
            },
        }
    }

    pub fn masked(&self) -> SettingsView {
        SettingsView {
            daily_limit: self.daily_limit,
            min_delay_seconds: self.min_delay_seconds,
            max_delay_seconds: self.max_delay_seconds,
            require_manual_review: self.require_manual_review,
            ai_enabled: self.ai_enabled,
            api_key: mask_secret(&self.api_key),
        }
    }
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        API_KEY_MASK.to_string()
    }
}

/// PUT /api/settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub daily_limit: Option<u32>,
    pub min_delay_seconds: Option<u64>,
    pub max_delay_seconds: Option<u64>,
    pub require_manual_review: Option<bool>,
    pub ai_enabled: Option<bool>,
    pub api_key: Option<String>,
}

/// Lo que devuelve GET /api/settings (api_key enmascarado)
#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    pub daily_limit: u32,
    pub min_delay_seconds: u64,
    pub max_delay_seconds: u64,
    pub require_manual_review: bool,
    pub ai_enabled: bool,
    pub api_key: String,
}

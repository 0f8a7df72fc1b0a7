//! error.rs
//! Errores tipados del dominio (composer, store, cuota, validación).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    /// No se pudo localizar un campo requerido del mensaje.
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// La acción de envío fue bloqueada (transporte, dirección inválida, etc.)
    #[error("Action blocked: {0}")]
    ActionBlocked(String),

    #[error("Daily limit reached ({sent}/{limit})")]
    QuotaExceeded { sent: u32, limit: u32 },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid recipient list: {0}")]
    InvalidRecipientList(String),

    #[error("Queue is empty")]
    EmptyQueue,

    #[error("A send sequence is already running")]
    AlreadyRunning,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for MailerError {
    fn from(e: sqlx::Error) -> Self {
        MailerError::StoreUnavailable(e.to_string())
    }
}

pub type MailerResult<T> = std::result::Result<T, MailerError>;

//! models/log_model.rs

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::message_model::MessageRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Sent,
    Failed,
}

impl SendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStatus::Sent => "sent",
            SendStatus::Failed => "failed",
        }
    }
}

/// Registro histórico de un intento de envío.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub to: String,
    pub company: String,
    pub role: String,
    pub subject: String,
    pub timestamp: DateTime<Utc>,
    pub status: SendStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEntry {
    pub fn from_message(
        msg: &MessageRequest,
        timestamp: DateTime<Utc>,
        status: SendStatus,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            to: msg.to.clone(),
            company: msg.company.clone(),
            role: msg.role.clone(),
            subject: msg.subject.clone(),
            timestamp,
            status,
            error_message,
        }
    }

    /// ISO-8601 en UTC con milisegundos, p.ej. `2026-10-16T09:30:00.000Z`
    pub fn iso_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Query de GET /api/logs
#[derive(Debug, Clone, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
    /// `all=true` ignora el límite
    pub all: Option<bool>,
}

//! handlers/mod.rs
//! Handlers HTTP (superficie de control del operador).
pub mod campaign_handler;
pub mod log_handler;
pub mod settings_handler;

use actix_web::{http::StatusCode, HttpResponse};
use serde_json::json;

use crate::error::MailerError;

/// Traduce un MailerError a una respuesta JSON con el status adecuado.
pub fn error_response(e: &MailerError) -> HttpResponse {
    let status = match e {
        MailerError::QuotaExceeded { .. } | MailerError::AlreadyRunning => StatusCode::CONFLICT,
        MailerError::InvalidSettings(_)
        | MailerError::InvalidRecipientList(_)
        | MailerError::EmptyQueue => StatusCode::BAD_REQUEST,
        MailerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        log::error!("Request failed: {}", e);
    }

    HttpResponse::build(status).json(json!({
        "success": false,
        "error": e.to_string()
    }))
}

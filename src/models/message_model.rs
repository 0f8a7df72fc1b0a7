//! models/message_model.rs
//! Destinatarios, mensajes en cola y requests para armar una campaña.

use serde::{Deserialize, Serialize};

/// Una fila de la lista de reclutadores (name, email, company, jobTitle).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub email: String,
    pub company: String,
    pub job_title: String,
}

/// Mensaje ya expandido, listo para el composer. No se modifica una vez encolado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub company: String,
    pub role: String,
}

/// POST /api/campaign/start y /api/recipients/preview
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignRequest {
    pub subject_template: String,
    pub body_template: String,
    /// CSV con header: name,email,company,jobTitle
    pub recipients_csv: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignPreview {
    pub total: usize,
    pub messages: Vec<MessageRequest>,
}

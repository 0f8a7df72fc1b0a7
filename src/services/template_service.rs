//! services/template_service.rs
//! Lectura de la lista de reclutadores (CSV) y expansión de plantillas.

use std::collections::VecDeque;

use rand::seq::SliceRandom;

use crate::{
    error::{MailerError, MailerResult},
    models::message_model::{MessageRequest, Recipient},
};

pub const DEFAULT_SALUTATION: &str = "Hiring Manager";

const CLOSINGS: [&str; 4] = ["Best regards", "Sincerely", "Kind regards", "Thank you"];

/// La primera fila es header; el resto se toma por posición:
/// name, email, company, jobTitle. Se descartan filas sin email.
pub fn parse_recipients(csv_text: &str) -> MailerResult<Vec<Recipient>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let mut recipients = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| MailerError::InvalidRecipientList(format!("row {}: {}", i + 2, e)))?;
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();

        let recipient = Recipient {
            name: field(0),
            email: field(1),
            company: field(2),
            job_title: field(3),
        };
        if recipient.email.is_empty() {
            continue;
        }
        recipients.push(recipient);
    }

    Ok(recipients)
}

pub fn process_template(template: &str, recipient: &Recipient) -> String {
    let name = if recipient.name.is_empty() {
        DEFAULT_SALUTATION
    } else {
        recipient.name.as_str()
    };

    let mut out = template
        .replace("{{name}}", name)
        .replace("{{email}}", &recipient.email)
        .replace("{{company}}", &recipient.company)
        .replace("{{jobTitle}}", &recipient.job_title);

    // Sólo generamos saludos/cierres aleatorios si la plantilla los pide
    if out.contains("{{greeting}}") {
        out = out.replace("{{greeting}}", &random_greeting(name));
    }
    if out.contains("{{closing}}") {
        out = out.replace("{{closing}}", random_closing());
    }
    out
}

pub fn build_queue(
    subject_template: &str,
    body_template: &str,
    recipients: &[Recipient],
) -> VecDeque<MessageRequest> {
    recipients
        .iter()
        .map(|r| MessageRequest {
            to: r.email.clone(),
            subject: process_template(subject_template, r),
            body: process_template(body_template, r),
            company: r.company.clone(),
            role: r.job_title.clone(),
        })
        .collect()
}

pub fn random_greeting(name: &str) -> String {
    let greetings = [
        format!("Dear {},", name),
        format!("Hello {},", name),
        format!("Hi {},", name),
    ];
    greetings
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| format!("Dear {},", name))
}

pub fn random_closing() -> &'static str {
    CLOSINGS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(CLOSINGS[0])
}

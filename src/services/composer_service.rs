//! services/composer_service.rs
//! El "composer": recibe un MessageRequest y lo deja compuesto (borrador)
//! o lo envía, según `require_manual_review`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::mailer_config::SmtpConfig,
    error::{MailerError, MailerResult},
    models::{message_model::MessageRequest, settings_model::Settings},
};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeOutcome {
    Submitted,
    /// Quedó como borrador para revisión humana
    Drafted(PathBuf),
}

#[async_trait]
pub trait Composer: Send + Sync {
    async fn compose(
        &self,
        msg: &MessageRequest,
        settings: &Settings,
    ) -> MailerResult<ComposeOutcome>;
}

#[derive(Debug, Clone)]
pub struct SmtpComposer {
    smtp: Option<SmtpConfig>,
    drafts_dir: PathBuf,
    settle_delay: Duration,
}

impl SmtpComposer {
    pub fn new(smtp: Option<SmtpConfig>, drafts_dir: PathBuf, settle_delay: Duration) -> Self {
        Self {
            smtp,
            drafts_dir,
            settle_delay,
        }
    }

    fn build_message(&self, msg: &MessageRequest) -> MailerResult<Message> {
        for (field, value) in [("to", &msg.to), ("subject", &msg.subject), ("body", &msg.body)] {
            if value.trim().is_empty() {
                return Err(MailerError::FieldNotFound(field.to_string()));
            }
        }

        let from: Mailbox = match &self.smtp {
            Some(smtp) => format!("{} <{}>", smtp.from_name, smtp.user),
            None => "Recruiter Mailer <drafts@localhost>".to_string(),
        }
        .parse()
        .map_err(|e| MailerError::ActionBlocked(format!("Invalid from address: {}", e)))?;

        let to: Mailbox = msg.to.parse().map_err(|e| {
            MailerError::ActionBlocked(format!("Invalid recipient address '{}': {}", msg.to, e))
        })?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&msg.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(msg.body.clone())
            .map_err(|e| MailerError::ActionBlocked(format!("Could not build message: {}", e)))
    }

    async fn save_draft(&self, msg: &MessageRequest, message: &Message) -> MailerResult<PathBuf> {
        tokio::fs::create_dir_all(&self.drafts_dir)
            .await
            .map_err(|e| MailerError::ActionBlocked(format!("Cannot create drafts dir: {}", e)))?;

        let safe_to: String = msg
            .to
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
            .collect();
        let file_name = format!(
            "{}-{}-{}.eml",
            Utc::now().format("%Y%m%d%H%M%S"),
            safe_to,
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );
        let path = self.drafts_dir.join(file_name);

        tokio::fs::write(&path, message.formatted())
            .await
            .map_err(|e| MailerError::ActionBlocked(format!("Cannot write draft: {}", e)))?;
        Ok(path)
    }

    async fn submit(&self, message: Message) -> MailerResult<()> {
        let smtp = self
            .smtp
            .as_ref()
            .ok_or_else(|| MailerError::ActionBlocked("SMTP is not configured".to_string()))?;

        let blocked = |e: lettre::transport::smtp::Error| MailerError::ActionBlocked(e.to_string());

        let tls_params = TlsParameters::new(smtp.host.clone()).map_err(blocked)?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
            .map_err(blocked)?
            .port(smtp.port)
            .credentials(Credentials::new(smtp.user.clone(), smtp.pass.clone()))
            .tls(Tls::Required(tls_params))
            .build();

        tokio::time::timeout(SMTP_TIMEOUT, mailer.send(message))
            .await
            .map_err(|_| MailerError::ActionBlocked("SMTP send timed out".to_string()))?
            .map_err(blocked)?;
        Ok(())
    }
}

#[async_trait]
impl Composer for SmtpComposer {
    async fn compose(
        &self,
        msg: &MessageRequest,
        settings: &Settings,
    ) -> MailerResult<ComposeOutcome> {
        log::info!("Componiendo mensaje para {}", msg.to);
        let message = self.build_message(msg)?;

        if settings.require_manual_review {
            let path = self.save_draft(msg, &message).await?;
            log::info!("Revisión manual requerida, borrador en {:?}", path);
            return Ok(ComposeOutcome::Drafted(path));
        }

        tokio::time::sleep(self.settle_delay).await;
        self.submit(message).await?;
        log::info!("Mensaje enviado a {}", msg.to);
        Ok(ComposeOutcome::Submitted)
    }
}

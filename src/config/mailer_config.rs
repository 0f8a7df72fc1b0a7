//! config/mailer_config.rs
//! Configuración del proceso (puerto, base de datos, SMTP, etc.), leída del entorno / .env

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1/models/gemini-pro:generateContent";

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from_name: String,
}

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub drafts_dir: PathBuf,
    /// None si no hay SMTP_HOST: sólo se pueden generar borradores
    pub smtp: Option<SmtpConfig>,
    /// Pausa entre componer y enviar
    pub settle_delay: Duration,
    pub error_backoff: Duration,
    pub quota_check_interval: Duration,
    pub gemini_url: String,
    pub ai_timeout: Duration,
}

impl Default for MailerConfig {
    fn default() -> Self {
        MailerConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: 5022,
            db_path: PathBuf::from("data").join("mailer.db"),
            drafts_dir: PathBuf::from("data").join("drafts"),
            smtp: None,
            settle_delay: Duration::from_millis(1000),
            error_backoff: Duration::from_secs(5),
            quota_check_interval: Duration::from_secs(60 * 60),
            gemini_url: DEFAULT_GEMINI_URL.to_string(),
            ai_timeout: Duration::from_secs(20),
        }
    }
}

impl MailerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = MailerConfig::default();

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT", 587)?,
                user: env::var("SMTP_USER").unwrap_or_default(),
                pass: env::var("SMTP_PASS").unwrap_or_default(),
                from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Recruiter Mailer".to_string()),
            }),
            _ => None,
        };

        Ok(MailerConfig {
            bind_addr: env::var("MAILER_BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_var("MAILER_PORT", defaults.port)?,
            db_path: env::var("MAILER_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            drafts_dir: env::var("MAILER_DRAFTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.drafts_dir),
            smtp,
            settle_delay: Duration::from_millis(parse_var("MAILER_SETTLE_MS", 1000)?),
            error_backoff: Duration::from_secs(parse_var("MAILER_ERROR_BACKOFF_SECS", 5)?),
            quota_check_interval: Duration::from_secs(
                parse_var::<u64>("MAILER_QUOTA_CHECK_MINUTES", 60)? * 60,
            ),
            gemini_url: env::var("GEMINI_API_URL").unwrap_or(defaults.gemini_url),
            ai_timeout: Duration::from_secs(parse_var("MAILER_AI_TIMEOUT_SECS", 20)?),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Valor inválido para {}: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;

use crate::config::mailer_config::MailerConfig;
use crate::logger::init_logger;
use crate::services::campaign_service::CampaignService;
use crate::services::composer_service::SmtpComposer;
use crate::services::enhancer_service::GeminiEnhancer;
use crate::services::log_service::LogService;
use crate::services::quota_service::QuotaService;
use crate::services::sequencer_service::Sequencer;
use crate::services::settings_service::SettingsService;
use crate::services::state_store::{self, SqliteStateStore, StateStore};
use crate::services::timing::{Clock, SystemClock, TokioTimer};

mod app;
mod config;
mod error;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = MailerConfig::from_env()?;
    if config.smtp.is_none() {
        log::warn!("SMTP_HOST no definido: sólo se podrán generar borradores");
    }

    // Store persistente (SQLite + migraciones)
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn StateStore> = Arc::new(SqliteStateStore::open(&config.db_path).await?);
    state_store::seed_defaults(store.as_ref(), clock.today())
        .await
        .context("No se pudo sembrar el estado inicial")?;

    let log_service = LogService::new(store.clone(), clock.clone());
    let quota_service = QuotaService::new(store.clone(), clock.clone());
    let settings_service = SettingsService::new(store.clone(), config.error_backoff);

    let composer = Arc::new(SmtpComposer::new(
        config.smtp.clone(),
        config.drafts_dir.clone(),
        config.settle_delay,
    ));
    let sequencer = Sequencer::new(
        store.clone(),
        composer,
        log_service.clone(),
        Arc::new(TokioTimer),
        config.error_backoff,
    );
    let campaign_service = CampaignService::new(
        store.clone(),
        quota_service.clone(),
        Arc::new(GeminiEnhancer::new(
            config.gemini_url.clone(),
            config.ai_timeout,
        )),
        sequencer,
    );

    // Reset diario: al arrancar y luego periódicamente
    quota_service.check_and_reset().await?;
    quota_service.spawn_periodic_reset(config.quota_check_interval);

    log::info!("Levantando servidor en {}:{}", config.bind_addr, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(campaign_service.clone()))
            .app_data(web::Data::new(log_service.clone()))
            .app_data(web::Data::new(quota_service.clone()))
            .app_data(web::Data::new(settings_service.clone()))
            .configure(app::init_app)
    })
    .workers(1)
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

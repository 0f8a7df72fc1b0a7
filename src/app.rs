//! app.rs
use crate::handlers::{campaign_handler, log_handler, settings_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/campaign")
                    .route(
                        "/start",
                        web::post().to(campaign_handler::start_campaign_endpoint),
                    )
                    .route(
                        "/pause",
                        web::post().to(campaign_handler::pause_campaign_endpoint),
                    )
                    .route(
                        "/resume",
                        web::post().to(campaign_handler::resume_campaign_endpoint),
                    )
                    .route(
                        "/status",
                        web::get().to(campaign_handler::campaign_status_endpoint),
                    ),
            )
            .route(
                "/recipients/preview",
                web::post().to(campaign_handler::preview_recipients_endpoint),
            )
            .route("/stats", web::get().to(log_handler::stats_endpoint))
            .service(
                web::scope("/logs")
                    .route("", web::get().to(log_handler::list_logs_endpoint))
                    .route("", web::delete().to(log_handler::clear_logs_endpoint))
                    .route("/export", web::get().to(log_handler::export_logs_endpoint)),
            )
            .service(
                web::scope("/settings")
                    .route("", web::get().to(settings_handler::get_settings_endpoint))
                    .route("", web::put().to(settings_handler::update_settings_endpoint)),
            )
            .route(
                "/quota/reset",
                web::post().to(log_handler::reset_quota_endpoint),
            ),
    );
}

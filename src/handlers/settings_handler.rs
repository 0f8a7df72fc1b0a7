//! handlers/settings_handler.rs
use actix_web::{web, HttpResponse};

use crate::{
    handlers::error_response, models::settings_model::UpdateSettingsRequest,
    services::settings_service::SettingsService,
};

/// GET /api/settings
pub async fn get_settings_endpoint(settings_service: web::Data<SettingsService>) -> HttpResponse {
    match settings_service.get().await {
        Ok(settings) => HttpResponse::Ok().json(settings.masked()),
        Err(e) => error_response(&e),
    }
}

/// PUT /api/settings
pub async fn update_settings_endpoint(
    settings_service: web::Data<SettingsService>,
    body: web::Json<UpdateSettingsRequest>,
) -> HttpResponse {
    match settings_service.update(body.into_inner()).await {
        Ok(settings) => HttpResponse::Ok().json(settings.masked()),
        Err(e) => error_response(&e),
    }
}

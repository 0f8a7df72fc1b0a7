//! handlers/campaign_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{
    handlers::error_response, models::message_model::CampaignRequest,
    services::campaign_service::CampaignService,
};

/// POST /api/campaign/start
pub async fn start_campaign_endpoint(
    campaign_service: web::Data<CampaignService>,
    body: web::Json<CampaignRequest>,
) -> HttpResponse {
    match campaign_service.start(&body).await {
        Ok(queued) => HttpResponse::Ok().json(json!({
            "success": true,
            "queued": queued,
            "message": "Send sequence started"
        })),
        Err(e) => error_response(&e),
    }
}

/// POST /api/campaign/pause
pub async fn pause_campaign_endpoint(campaign_service: web::Data<CampaignService>) -> HttpResponse {
    let state = campaign_service.sequencer().pause().await;
    HttpResponse::Ok().json(json!({ "success": true, "state": state }))
}

/// POST /api/campaign/resume
pub async fn resume_campaign_endpoint(
    campaign_service: web::Data<CampaignService>,
) -> HttpResponse {
    let state = campaign_service.sequencer().resume().await;
    HttpResponse::Ok().json(json!({ "success": true, "state": state }))
}

/// GET /api/campaign/status
pub async fn campaign_status_endpoint(
    campaign_service: web::Data<CampaignService>,
) -> HttpResponse {
    HttpResponse::Ok().json(campaign_service.sequencer().status().await)
}

/// POST /api/recipients/preview
pub async fn preview_recipients_endpoint(
    campaign_service: web::Data<CampaignService>,
    body: web::Json<CampaignRequest>,
) -> HttpResponse {
    match campaign_service.preview(&body) {
        Ok(preview) => HttpResponse::Ok().json(preview),
        Err(e) => error_response(&e),
    }
}

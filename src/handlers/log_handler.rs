//! handlers/log_handler.rs
//! Estadísticas, historial, export CSV y reset de cuota.

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{
    handlers::error_response,
    models::{log_model::LogsQuery, stats_model::StatsResponse},
    services::{
        log_service::{LogService, DEFAULT_LOG_LIMIT},
        quota_service::QuotaService,
    },
};

/// GET /api/stats
pub async fn stats_endpoint(log_service: web::Data<LogService>) -> HttpResponse {
    let stats = match log_service.get_stats().await {
        Ok(stats) => stats,
        Err(e) => return error_response(&e),
    };
    match log_service.get_logs(Some(DEFAULT_LOG_LIMIT)).await {
        Ok(logs) => HttpResponse::Ok().json(StatsResponse { stats, logs }),
        Err(e) => error_response(&e),
    }
}

/// GET /api/logs?limit=N&all=true
pub async fn list_logs_endpoint(
    log_service: web::Data<LogService>,
    query: web::Query<LogsQuery>,
) -> HttpResponse {
    let limit = if query.all.unwrap_or(false) {
        None
    } else {
        Some(query.limit.unwrap_or(DEFAULT_LOG_LIMIT))
    };

    match log_service.get_logs(limit).await {
        Ok(logs) => HttpResponse::Ok().json(logs),
        Err(e) => error_response(&e),
    }
}

/// DELETE /api/logs
pub async fn clear_logs_endpoint(log_service: web::Data<LogService>) -> HttpResponse {
    match log_service.clear_logs().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "message": "Logs cleared" })),
        Err(e) => error_response(&e),
    }
}

/// GET /api/logs/export
pub async fn export_logs_endpoint(log_service: web::Data<LogService>) -> HttpResponse {
    match log_service.export_to_csv().await {
        Ok(csv) => HttpResponse::Ok()
            .append_header(("Content-Type", "text/csv; charset=utf-8"))
            .append_header((
                "Content-Disposition",
                "attachment; filename=\"email_logs.csv\"",
            ))
            .body(csv),
        Err(e) => error_response(&e),
    }
}

/// POST /api/quota/reset
pub async fn reset_quota_endpoint(quota_service: web::Data<QuotaService>) -> HttpResponse {
    match quota_service.check_and_reset().await {
        Ok(stats) => HttpResponse::Ok().json(json!({ "success": true, "stats": stats })),
        Err(e) => error_response(&e),
    }
}

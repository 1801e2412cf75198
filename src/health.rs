use actix_web::{web, HttpResponse};
use chrono::Utc;
use tracing::warn;

use crate::AppState;

const HEALTHY: &str = "healthy";
const UNHEALTHY: &str = "unhealthy";

/// Root endpoint: identifies the service.
pub async fn root(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "app_name": state.config.app_name,
        "status": "Backend running",
        "environment": state.config.environment,
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn database_status(state: &AppState) -> &'static str {
    match state.auth_service.directory().ping().await {
        Ok(()) => HEALTHY,
        Err(e) => {
            warn!("Health check: user directory unreachable: {}", e);
            UNHEALTHY
        }
    }
}

/// Health check endpoint handler.
/// Reports `degraded` when any dependency check fails.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = database_status(&state).await;

    let checks = serde_json::json!({
        "database": database,
        "auth": HEALTHY,
        "api": HEALTHY,
    });
    let status = if database == HEALTHY { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(serde_json::json!({
        "status": status,
        "service": state.config.app_name,
        "environment": state.config.environment,
        "checks": checks,
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// Detailed status: running services plus the user directory backend.
pub async fn detailed_status(state: web::Data<AppState>) -> HttpResponse {
    let backend = if state.config.database.url.is_some() { "postgresql" } else { "in-memory" };

    HttpResponse::Ok().json(serde_json::json!({
        "status": "operational",
        "timestamp": Utc::now().to_rfc3339(),
        "system": {
            "environment": state.config.environment,
            "version": env!("CARGO_PKG_VERSION"),
            "workers": state.config.server.workers,
        },
        "services": {
            "health_service": "running",
            "auth_service": "running",
            "api_gateway": "running",
        },
        "database": {
            "status": database_status(&state).await,
            "type": backend,
        }
    }))
}

pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "pong",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

pub async fn version(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "api_name": state.config.app_name,
        "timestamp": Utc::now().to_rfc3339()
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health_check))
        .route("/health/ping", web::get().to(ping))
        .route("/health/status", web::get().to(detailed_status))
        .route("/health/version", web::get().to(version));
}

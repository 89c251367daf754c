use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub document_store: String,
    pub identity_provider: String,
    pub live_sessions: usize,
    pub timestamp: i64,
}

/// Liveness plus the backends this instance was started with.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        document_store: state.backends.store.to_string(),
        identity_provider: state.backends.identity.to_string(),
        live_sessions: state.sessions.len(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

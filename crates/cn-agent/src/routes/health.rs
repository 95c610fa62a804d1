//! Health check endpoint.

use axum::Json;
use chrono::Utc;

use cn_protocol::queries::HealthResponse;

/// GET /health — liveness check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

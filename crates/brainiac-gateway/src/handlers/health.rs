//! Health check handler.

use crate::models::HealthResponse;
use axum::Json;

/// Liveness probe handler.
///
/// Returns `{"status":"ok","version":...}`. Does NOT check the identity
/// provider; the gateway can serve gated routes without it.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

//! `/metrics` scrape endpoint.
//!
//! Public, like `/health`. Metric labels never carry tokens or user ids, so
//! the exposition is safe to serve without a session.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Render the Prometheus text exposition.
#[tracing::instrument(skip_all, name = "gw.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

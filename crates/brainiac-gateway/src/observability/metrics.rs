//! Metrics definitions for the Brainiac Gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gw_` prefix for the gateway
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: fixed route set, everything else is `/other`
//! - `status`: 3 values for HTTP (success, error, timeout)
//! - `operation`: provider calls (debug_token, profile, accounts, feed_post)
//! - `outcome`: bounded by error variants
//!
//! No user identifiers or tokens are ever used as label values.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // HTTP request buckets (login includes two provider round trips)
        .set_buckets_for_metric(
            Matcher::Prefix("gw_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Graph API buckets, bounded by the provider timeout
        .set_buckets_for_metric(
            Matcher::Prefix("gw_provider_request".to_string()),
            &[
                0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set provider request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `gw_http_requests_total`, `gw_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// This captures ALL HTTP responses including framework-level errors like
/// 404, 405 and 415.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("gw_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("gw_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Map a request path onto the fixed route set.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/api/v1/me" => "/api/v1/me",
        "/api/facebook/auth" => "/api/facebook/auth",
        "/api/facebook/pages" => "/api/facebook/pages",
        "/api/facebook/post" => "/api/facebook/post",
        _ => "/other",
    }
}

// ============================================================================
// Provider (Graph API) Metrics
// ============================================================================

/// Record a Graph API call.
///
/// Metric: `gw_provider_request_duration_seconds`, `gw_provider_requests_total`
/// Labels: `operation`, `status`
///
/// Operations: "debug_token", "profile", "accounts", "feed_post"
/// Status: "success" or a provider error label
pub fn record_provider_request(operation: &str, status: &str, duration: Duration) {
    histogram!("gw_provider_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("gw_provider_requests_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Record a login attempt on `/api/facebook/auth`.
///
/// Metric: `gw_login_attempts_total`
/// Labels: `outcome` ("success", "bad_request", "issue_failed", or a
/// verification failure label)
pub fn record_login_attempt(outcome: &str) {
    counter!("gw_login_attempts_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a session gate decision.
///
/// Metric: `gw_session_validations_total`
/// Labels: `outcome` ("admitted", "missing_header", "malformed_header", or a
/// session token failure label)
pub fn record_session_validation(outcome: &str) {
    counter!("gw_session_validations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests execute the recording functions against the global no-op
    // recorder; values are asserted in the /metrics integration test.

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/health", 200, Duration::from_millis(5));
        record_http_request("GET", "/api/v1/me", 401, Duration::from_millis(2));
        record_http_request("POST", "/api/facebook/auth", 200, Duration::from_millis(300));
        record_http_request("GET", "/nope", 404, Duration::from_millis(1));
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(299), "success");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(400), "error");
        assert_eq!(categorize_status_code(401), "error");
        assert_eq!(categorize_status_code(502), "error");
    }

    #[test]
    fn test_normalize_endpoint_known_paths() {
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/api/v1/me"), "/api/v1/me");
        assert_eq!(
            normalize_endpoint("/api/facebook/auth"),
            "/api/facebook/auth"
        );
        assert_eq!(
            normalize_endpoint("/api/facebook/pages"),
            "/api/facebook/pages"
        );
        assert_eq!(
            normalize_endpoint("/api/facebook/post"),
            "/api/facebook/post"
        );
    }

    #[test]
    fn test_normalize_endpoint_unknown_paths() {
        assert_eq!(normalize_endpoint("/unknown"), "/other");
        assert_eq!(normalize_endpoint("/api/facebook/auth/extra"), "/other");
        assert_eq!(normalize_endpoint("/api/v1/me/10001"), "/other");
    }

    #[test]
    fn test_record_provider_request() {
        record_provider_request("debug_token", "success", Duration::from_millis(80));
        record_provider_request("profile", "rejected", Duration::from_millis(90));
        record_provider_request("accounts", "unreachable", Duration::from_secs(10));
    }

    #[test]
    fn test_record_session_metrics() {
        record_login_attempt("success");
        record_login_attempt("invalid_token");
        record_session_validation("admitted");
        record_session_validation("expired");
    }
}

//! HTTP routes for the Brainiac Gateway.
//!
//! Defines the Axum router and application state.

use crate::auth::SessionTokenService;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_session, AuthState};
use crate::services::IdentityProvider;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use crate::observability::metrics::init_metrics_recorder;

/// Whole-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Session token issuance and validation.
    pub session_tokens: Arc<SessionTokenService>,

    /// Identity provider (Facebook Graph API in production).
    pub identity_provider: Arc<dyn IdentityProvider>,
}

/// Build the CORS layer from the configured origin.
fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.cors_allowed_origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(&config.cors_allowed_origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                // Config validation rejects this; deny cross-origin if it slips through
                tracing::error!(target: "gw.routes", error = %e, "Invalid CORS origin");
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(handlers::facebook::FACEBOOK_TOKEN_HEADER),
        ])
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/api/facebook/auth` - Provider login, issues a session token - public
/// - `/api/facebook/pages` - Page listing proxy - Facebook token header
/// - `/api/facebook/post` - Page post proxy - page token in body
/// - `/api/v1/me` - Current identity - requires a session token
/// - CORS, TraceLayer, 30 second request timeout
/// - HTTP metrics middleware (outermost)
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        session_tokens: state.session_tokens.clone(),
    });
    let cors = cors_layer(&state.config);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/facebook/auth", post(handlers::authenticate))
        .route("/api/facebook/pages", get(handlers::list_pages))
        .route("/api/facebook/post", post(handlers::post_to_page))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (session required)
    let protected_routes = Router::new()
        .route("/api/v1/me", get(handlers::get_me))
        .route_layer(middleware::from_fn_with_state(auth_state, require_session))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. CorsLayer - answers preflight before anything else runs
    // 2. TimeoutLayer - Timeout the request
    // 3. TraceLayer - Log request details
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}

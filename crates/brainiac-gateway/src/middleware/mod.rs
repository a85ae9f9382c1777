//! Middleware for the Brainiac Gateway.
//!
//! # Components
//!
//! - `auth` - Session gate for protected routes
//! - `http_metrics` - HTTP request metrics middleware

pub mod auth;
pub mod http_metrics;

pub use auth::{parse_bearer, require_session, AuthState, AuthenticatedUserExt};
pub use http_metrics::http_metrics_middleware;

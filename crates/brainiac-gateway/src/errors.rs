//! Brainiac Gateway error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Error messages returned to clients are intentionally generic to avoid
//! leaking internal details. Actual errors are logged server-side.

use crate::auth::SessionTokenError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Realm advertised in `WWW-Authenticate` on every 401.
const AUTH_REALM_HEADER: &str = "Bearer realm=\"brainiac-api\"";

/// Gateway error type.
///
/// Maps to HTTP status codes:
/// - MissingAuthorization, MalformedAuthorization, InvalidSession,
///   MissingProviderToken: 401 Unauthorized
/// - BadRequest: 400 Bad Request
/// - Upstream: 502 Bad Gateway
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing Authorization header")]
    MissingAuthorization,

    #[error("Malformed Authorization header")]
    MalformedAuthorization,

    #[error("Invalid session: {0}")]
    InvalidSession(SessionTokenError),

    #[error("Missing provider token")]
    MissingProviderToken,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal,
}

impl From<SessionTokenError> for ApiError {
    fn from(err: SessionTokenError) -> Self {
        ApiError::InvalidSession(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::MissingAuthorization => (
                StatusCode::UNAUTHORIZED,
                "MISSING_AUTHORIZATION",
                "Authorization header is required".to_string(),
            ),
            ApiError::MalformedAuthorization => (
                StatusCode::UNAUTHORIZED,
                "MALFORMED_AUTHORIZATION",
                "Authorization header must be 'Bearer <token>'".to_string(),
            ),
            // One message for every kind; the kind itself is logged by the gate
            ApiError::InvalidSession(_) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SESSION",
                "The session token is invalid or expired".to_string(),
            ),
            ApiError::MissingProviderToken => (
                StatusCode::UNAUTHORIZED,
                "MISSING_PROVIDER_TOKEN",
                "X-Facebook-Token header is required".to_string(),
            ),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone()),
            ApiError::Upstream(reason) => {
                // Log actual reason server-side
                tracing::warn!(target: "gw.upstream", reason = %reason, "Identity provider request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "Identity provider request failed".to_string(),
                )
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            let challenge = match self {
                ApiError::InvalidSession(_) => {
                    format!("{AUTH_REALM_HEADER}, error=\"invalid_token\"")
                }
                _ => AUTH_REALM_HEADER.to_string(),
            };
            if let Ok(header_value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, header_value);
            }
        }

        response
    }
}

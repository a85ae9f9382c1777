//! Login handler.
//!
//! Exchanges a Facebook provider token for a Brainiac session token.
//!
//! # Security
//!
//! - The provider token is held as a `SecretString` and never logged
//! - Verification failures return one generic message; the reason is logged
//! - A session is minted only after both provider checks succeed

use crate::auth::IssuedSession;
use crate::errors::ApiError;
use crate::models::UserResponse;
use crate::observability::metrics::record_login_attempt;
use crate::routes::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use common::secret::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Request body for `POST /api/facebook/auth`.
///
/// Older clients send `access_token` and a `user_id`; the id is ignored
/// because the subject is taken from introspection.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(alias = "access_token")]
    pub provider_token: SecretString,
}

/// Response body for `POST /api/facebook/auth`.
#[derive(Serialize)]
pub struct AuthResponse {
    pub valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,

    pub message: String,

    /// Session token (only on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Session expiry, Unix epoch seconds (only on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl AuthResponse {
    fn failure(message: &str) -> Self {
        Self {
            valid: false,
            user: None,
            message: message.to_string(),
            token: None,
            expires_at: None,
        }
    }
}

/// Handler for POST /api/facebook/auth
///
/// ## Response
///
/// - 200 `{valid:true, user, message, token, expires_at}` on success
/// - 400 `{valid:false, message}` for an unreadable body or empty token
/// - 401 `{valid:false, message}` when verification fails for any reason
/// - 500 error envelope if the session cannot be signed
#[instrument(skip_all, name = "gw.handlers.auth")]
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(target: "gw.handlers.auth", error = %rejection, "Rejected login body");
            record_login_attempt("bad_request");
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(AuthResponse::failure("Invalid request body")),
            ));
        }
    };

    let provider_token = request.provider_token.expose_secret().trim();
    if provider_token.is_empty() {
        record_login_attempt("bad_request");
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(AuthResponse::failure("provider_token is required")),
        ));
    }

    let identity = match state
        .identity_provider
        .validate_external_token(provider_token)
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(
                target: "gw.handlers.auth",
                reason = e.as_str(),
                error = %e,
                "Provider token verification failed"
            );
            record_login_attempt(e.as_str());
            return Ok((
                StatusCode::UNAUTHORIZED,
                Json(AuthResponse::failure("Invalid Facebook token")),
            ));
        }
    };

    let IssuedSession { token, claims } = state
        .session_tokens
        .mint_at(
            &identity.subject_id,
            identity.email.as_deref().unwrap_or_default(),
            &identity.display_name,
            Utc::now(),
        )
        .map_err(|e| {
            tracing::error!(target: "gw.handlers.auth", error = %e, "Failed to issue session token");
            record_login_attempt("issue_failed");
            ApiError::Internal
        })?;

    record_login_attempt("success");
    tracing::info!(target: "gw.handlers.auth", "Session issued");

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            valid: true,
            user: Some(UserResponse::from(&identity)),
            message: "Authentication successful".to_string(),
            token: Some(token),
            expires_at: Some(claims.expires_at),
        }),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::{SessionTokenService, SigningKey};
    use crate::config::Config;
    use crate::models::IdentityClaims;
    use crate::services::{IdentityProvider, VerificationError};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Provider that answers every verification with a fixed result.
    struct FixedProvider(Result<IdentityClaims, VerificationError>);

    #[async_trait]
    impl IdentityProvider for FixedProvider {
        async fn validate_external_token(
            &self,
            _provider_token: &str,
        ) -> Result<IdentityClaims, VerificationError> {
            self.0.clone()
        }

        async fn list_pages(
            &self,
            _user_token: &str,
        ) -> Result<Vec<serde_json::Value>, VerificationError> {
            Ok(Vec::new())
        }

        async fn post_to_page(
            &self,
            _page_id: &str,
            _page_token: &str,
            _message: &str,
        ) -> Result<String, VerificationError> {
            Ok(String::new())
        }
    }

    fn state(provider: FixedProvider) -> Arc<AppState> {
        let config = Config::from_vars(&HashMap::from([
            ("FACEBOOK_APP_ID".to_string(), "app".to_string()),
            ("FACEBOOK_APP_SECRET".to_string(), "secret".to_string()),
            ("JWT_SECRET".to_string(), "handler-secret".to_string()),
        ]))
        .unwrap();
        let session_tokens = Arc::new(SessionTokenService::new(&SigningKey::from_config(&config)));

        Arc::new(AppState {
            config,
            session_tokens,
            identity_provider: Arc::new(provider),
        })
    }

    fn request(token: &str) -> Result<Json<AuthRequest>, JsonRejection> {
        Ok(Json(AuthRequest {
            provider_token: SecretString::from(token),
        }))
    }

    fn ada() -> IdentityClaims {
        IdentityClaims {
            subject_id: "10001".to_string(),
            display_name: "Ada".to_string(),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_success_mints_validating_session() {
        let state = state(FixedProvider(Ok(ada())));

        let (status, Json(body)) = authenticate(State(state.clone()), request("EAAB"))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(body.valid);
        assert_eq!(body.user.as_ref().unwrap().id, "10001");
        assert_eq!(body.user.as_ref().unwrap().email, "");

        let claims = state
            .session_tokens
            .validate(body.token.as_deref().unwrap())
            .unwrap();
        assert_eq!(claims.subject_id, "10001");
        assert_eq!(Some(claims.expires_at), body.expires_at);
    }

    #[tokio::test]
    async fn test_verification_failure_is_generic_401() {
        for err in [
            VerificationError::InvalidExternalToken,
            VerificationError::ProviderRejected("token revoked for app 42".to_string()),
            VerificationError::ProviderUnreachable,
            VerificationError::MalformedProviderResponse,
        ] {
            let (status, Json(body)) =
                authenticate(State(state(FixedProvider(Err(err)))), request("EAAB"))
                    .await
                    .unwrap();

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(!body.valid);
            assert!(body.token.is_none());
            assert_eq!(body.message, "Invalid Facebook token");
        }
    }

    #[tokio::test]
    async fn test_blank_token_is_bad_request() {
        let (status, Json(body)) =
            authenticate(State(state(FixedProvider(Ok(ada())))), request("   "))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.valid);
    }

    #[test]
    fn test_auth_request_accepts_legacy_shape() {
        let request: AuthRequest =
            serde_json::from_str(r#"{"access_token":"EAAB","user_id":"10001"}"#).unwrap();
        assert_eq!(request.provider_token.expose_secret(), "EAAB");

        let debug_str = format!("{:?}", request);
        assert!(!debug_str.contains("EAAB"));
    }

    #[test]
    fn test_failure_response_omits_success_fields() {
        let json = serde_json::to_value(AuthResponse::failure("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"valid": false, "message": "nope"}));
    }
}

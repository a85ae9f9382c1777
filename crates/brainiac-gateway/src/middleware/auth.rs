//! Session gate for protected routes.
//!
//! `require_session` extracts the Bearer token from the Authorization header,
//! validates it with the session token service, and injects the verified
//! identity into request extensions. Everything happens in-process; no
//! network or storage calls are made.
//!
//! Rejections are distinct at the HTTP layer only by error code:
//! missing header, malformed header, or invalid session. The specific
//! session failure kind is logged and counted, never returned.

use crate::auth::SessionTokenService;
use crate::errors::ApiError;
use crate::models::AuthenticatedUser;
use crate::observability::metrics::record_session_validation;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the session gate.
#[derive(Clone)]
pub struct AuthState {
    /// Session token service used to validate bearer tokens.
    pub session_tokens: Arc<SessionTokenService>,
}

/// Extract the Bearer token from request headers.
///
/// The header value is split on single spaces and must yield exactly two
/// parts: the literal `Bearer` and a non-empty token.
///
/// # Errors
///
/// - `MissingAuthorization` - header absent or empty
/// - `MalformedAuthorization` - not visible ASCII, or not `Bearer <token>`
pub fn parse_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let raw = headers
        .get(AUTHORIZATION)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            tracing::debug!(target: "gw.middleware.auth", "Missing Authorization header");
            ApiError::MissingAuthorization
        })?;

    let value = raw.to_str().map_err(|_| {
        tracing::debug!(target: "gw.middleware.auth", "Authorization header is not visible ASCII");
        ApiError::MalformedAuthorization
    })?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => {
            tracing::debug!(target: "gw.middleware.auth", "Invalid Authorization header format");
            Err(ApiError::MalformedAuthorization)
        }
    }
}

/// Session gate middleware.
///
/// # Response
///
/// - Returns 401 Unauthorized if the header is missing or malformed, or the
///   session token does not validate
/// - Continues to next handler with `AuthenticatedUser` in extensions otherwise
#[instrument(skip_all, name = "gw.middleware.auth")]
pub async fn require_session(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = match parse_bearer(req.headers()) {
        Ok(token) => token,
        Err(e) => {
            let outcome = match e {
                ApiError::MissingAuthorization => "missing_header",
                _ => "malformed_header",
            };
            record_session_validation(outcome);
            return Err(e);
        }
    };

    let claims = state.session_tokens.validate(token).map_err(|kind| {
        tracing::debug!(
            target: "gw.middleware.auth",
            reason = kind.as_str(),
            "Session token rejected"
        );
        record_session_validation(kind.as_str());
        kind
    })?;

    record_session_validation("admitted");
    req.extensions_mut()
        .insert(AuthenticatedUser::from(claims));

    Ok(next.run(req).await)
}

/// Extension trait for reading the admitted identity from a request.
pub trait AuthenticatedUserExt {
    /// Get the identity inserted by `require_session`.
    ///
    /// Returns `None` if the gate was not applied to this request.
    fn authenticated_user(&self) -> Option<&AuthenticatedUser>;
}

impl<B> AuthenticatedUserExt for axum::http::Request<B> {
    fn authenticated_user(&self) -> Option<&AuthenticatedUser> {
        self.extensions().get::<AuthenticatedUser>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::SigningKey;
    use axum::{
        body::Body,
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::{Duration, Utc};
    use common::secret::SecretString;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn headers_with(value: &[u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(value).unwrap());
        headers
    }

    fn service() -> Arc<SessionTokenService> {
        Arc::new(SessionTokenService::new(&SigningKey::new(
            SecretString::from("gate-test-secret"),
        )))
    }

    async fn whoami(req: Request) -> String {
        req.authenticated_user()
            .map(|u| format!("{}|{}|{}", u.subject_id, u.email, u.display_name))
            .unwrap_or_default()
    }

    fn app(session_tokens: Arc<SessionTokenService>) -> Router {
        let auth_state = Arc::new(AuthState { session_tokens });
        Router::new()
            .route("/protected", get(whoami))
            .route_layer(middleware::from_fn_with_state(auth_state, require_session))
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, serde_json::Value, String) {
        let mut builder = axum::http::Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let json = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);
        (status, json, text)
    }

    #[test]
    fn test_parse_bearer_accepts_well_formed_header() {
        let headers = headers_with(b"Bearer abc.def.ghi");
        assert_eq!(parse_bearer(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_parse_bearer_missing_header() {
        assert!(matches!(
            parse_bearer(&HeaderMap::new()),
            Err(ApiError::MissingAuthorization)
        ));
        assert!(matches!(
            parse_bearer(&headers_with(b"")),
            Err(ApiError::MissingAuthorization)
        ));
    }

    #[test]
    fn test_parse_bearer_malformed_shapes() {
        for value in [
            "abc.def.ghi",
            "Basic dXNlcjpwYXNz",
            "bearer abc",
            "Bearer",
            "Bearer ",
            "Bearer a b",
            "Bearer  abc",
        ] {
            assert!(
                matches!(
                    parse_bearer(&headers_with(value.as_bytes())),
                    Err(ApiError::MalformedAuthorization)
                ),
                "{value:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_parse_bearer_rejects_non_ascii() {
        assert!(matches!(
            parse_bearer(&headers_with(b"Bearer \xfftoken")),
            Err(ApiError::MalformedAuthorization)
        ));
    }

    #[test]
    fn test_auth_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AuthState>();
    }

    #[tokio::test]
    async fn test_valid_session_is_admitted_with_identity() {
        let session_tokens = service();
        let token = session_tokens
            .issue("10001", "ada@example.com", "Ada")
            .unwrap();

        let (status, _, body) = call(app(session_tokens), Some(&format!("Bearer {token}"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "10001|ada@example.com|Ada");
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let (status, json, _) = call(app(service()), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "MISSING_AUTHORIZATION");
    }

    #[tokio::test]
    async fn test_malformed_header_rejected() {
        let token = service().issue("10001", "", "Ada").unwrap();

        for value in [token.clone(), format!("Token {token}"), format!("Bearer {token} extra")] {
            let (status, json, _) = call(app(service()), Some(&value)).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["error"]["code"], "MALFORMED_AUTHORIZATION");
        }
    }

    #[tokio::test]
    async fn test_invalid_session_rejected_with_generic_body() {
        let session_tokens = service();
        let expired = session_tokens
            .issue_at("10001", "", "Ada", Utc::now() - Duration::hours(48))
            .unwrap();
        let foreign = SessionTokenService::new(&SigningKey::new(SecretString::from("other")))
            .issue("10001", "", "Ada")
            .unwrap();

        let mut bodies = Vec::new();
        for token in [expired, foreign, "not-a-jwt".to_string()] {
            let (status, json, _) =
                call(app(session_tokens.clone()), Some(&format!("Bearer {token}"))).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["error"]["code"], "INVALID_SESSION");
            bodies.push(json);
        }

        // Failure kinds are indistinguishable to the client
        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
    }
}

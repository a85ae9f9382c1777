//! Current user handler.
//!
//! Echoes the identity the session gate admitted.

use crate::models::{AuthenticatedUser, UserResponse};
use axum::{Extension, Json};
use tracing::instrument;

/// Handler for GET /api/v1/me
///
/// Requires the session gate.
///
/// ## Response
///
/// ```json
/// {"id": "10001", "name": "Ada Lovelace", "email": "ada@example.com"}
/// ```
#[instrument(skip_all, name = "gw.handlers.me")]
pub async fn get_me(Extension(user): Extension<AuthenticatedUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_me_echoes_identity() {
        let user = AuthenticatedUser {
            subject_id: "10001".to_string(),
            email: "ada@example.com".to_string(),
            display_name: "Ada Lovelace".to_string(),
        };

        let Json(body) = get_me(Extension(user)).await;

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"id": "10001", "name": "Ada Lovelace", "email": "ada@example.com"})
        );
    }
}

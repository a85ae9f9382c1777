//! Data models for the Brainiac Gateway.

use crate::auth::SessionClaims;
use serde::Serialize;
use std::fmt;

/// Identity verified by the external provider.
///
/// Produced by the identity provider verifier and used to mint a session.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    /// Provider-scoped user id.
    pub subject_id: String,

    /// Display name.
    pub display_name: String,

    /// Email address, `None` when the provider did not share one.
    pub email: Option<String>,
}

impl fmt::Debug for IdentityClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityClaims")
            .field("subject_id", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Identity of a request admitted by the session gate.
///
/// Inserted into request extensions by `require_session`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub subject_id: String,
    pub email: String,
    pub display_name: String,
}

impl fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("subject_id", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            subject_id: claims.subject_id,
            email: claims.email,
            display_name: claims.display_name,
        }
    }
}

/// User object returned to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&IdentityClaims> for UserResponse {
    fn from(identity: &IdentityClaims) -> Self {
        Self {
            id: identity.subject_id.clone(),
            name: identity.display_name.clone(),
            email: identity.email.clone().unwrap_or_default(),
        }
    }
}

impl From<&AuthenticatedUser> for UserResponse {
    fn from(user: &AuthenticatedUser) -> Self {
        Self {
            id: user.subject_id.clone(),
            name: user.display_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn identity(email: Option<&str>) -> IdentityClaims {
        IdentityClaims {
            subject_id: "10001".to_string(),
            display_name: "Ada Lovelace".to_string(),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_user_response_from_identity_without_email() {
        let user = UserResponse::from(&identity(None));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "10001", "name": "Ada Lovelace", "email": ""})
        );
    }

    #[test]
    fn test_authenticated_user_from_session_claims() {
        let claims = SessionClaims {
            subject_id: "10001".to_string(),
            email: "ada@example.com".to_string(),
            display_name: "Ada Lovelace".to_string(),
            issued_at: 1,
            not_before: 1,
            expires_at: 2,
            issuer: "brainiac-backend".to_string(),
        };

        let user = AuthenticatedUser::from(claims);
        assert_eq!(user.subject_id, "10001");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.display_name, "Ada Lovelace");
    }

    #[test]
    fn test_debug_redacts_identifiers() {
        let debug_str = format!("{:?}", identity(Some("ada@example.com")));
        assert!(!debug_str.contains("10001"));
        assert!(!debug_str.contains("ada@example.com"));

        let user = AuthenticatedUser {
            subject_id: "10001".to_string(),
            email: "ada@example.com".to_string(),
            display_name: "Ada".to_string(),
        };
        let debug_str = format!("{:?}", user);
        assert!(!debug_str.contains("10001"));
        assert!(!debug_str.contains("ada@example.com"));
    }
}

//! Session token service.
//!
//! Issues and validates the self-contained session token handed to clients
//! after a successful provider login. Tokens are compact JWS (HS256) with a
//! fixed 24 hour lifetime and a fixed issuer. Nothing is stored server-side:
//! a token stays valid until it expires.
//!
//! # Security
//!
//! - Only HS256 is accepted; the header `alg` is checked before any
//!   cryptographic work, so `none`, other HMAC widths and asymmetric
//!   algorithms are rejected as an algorithm mismatch
//! - Tokens are size-checked BEFORE parsing (see `common::jwt`)
//! - No leeway on `exp`/`nbf`
//! - Failure kinds are for logs and metrics only; clients see one message

use crate::auth::signing_key::SigningKey;
use chrono::{DateTime, Utc};
use common::jwt::{extract_alg, JwtValidationError};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::instrument;

/// Fixed `iss` claim for every session token.
pub const SESSION_ISSUER: &str = "brainiac-backend";

/// Session lifetime (24 hours).
pub const SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;

const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;
const SESSION_ALGORITHM_NAME: &str = "HS256";

/// Claims embedded in a session token.
///
/// Field names on the wire are kept short (`user_id`, `name`, ...) so tokens
/// minted by earlier backend releases keep validating.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Provider-scoped user id - redacted in Debug output.
    #[serde(rename = "user_id")]
    pub subject_id: String,

    /// Email address, empty when the provider did not share one.
    pub email: String,

    /// Display name.
    #[serde(rename = "name")]
    pub display_name: String,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(rename = "nbf")]
    pub not_before: i64,

    /// Expiration timestamp (Unix epoch seconds).
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// Issuer, always [`SESSION_ISSUER`].
    #[serde(rename = "iss")]
    pub issuer: String,
}

/// Custom Debug implementation that redacts user identifiers.
impl fmt::Debug for SessionClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClaims")
            .field("subject_id", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("issued_at", &self.issued_at)
            .field("not_before", &self.not_before)
            .field("expires_at", &self.expires_at)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Errors from [`SessionTokenService::issue`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionIssueError {
    #[error("Session subject id must not be empty")]
    EmptySubject,

    #[error("Failed to sign session token: {0}")]
    Signing(String),
}

/// Reasons a session token was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionTokenError {
    #[error("Session token is malformed")]
    MalformedToken,

    #[error("Session token signature does not verify")]
    BadSignature,

    #[error("Session token has expired")]
    ExpiredToken,

    #[error("Session token uses an unexpected algorithm")]
    AlgorithmMismatch,

    #[error("Session token is not yet valid")]
    NotYetValid,

    #[error("Session token has an unexpected issuer")]
    InvalidIssuer,
}

impl SessionTokenError {
    /// Bounded label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionTokenError::MalformedToken => "malformed",
            SessionTokenError::BadSignature => "bad_signature",
            SessionTokenError::ExpiredToken => "expired",
            SessionTokenError::AlgorithmMismatch => "algorithm_mismatch",
            SessionTokenError::NotYetValid => "not_yet_valid",
            SessionTokenError::InvalidIssuer => "invalid_issuer",
        }
    }
}

impl From<JwtValidationError> for SessionTokenError {
    fn from(_: JwtValidationError) -> Self {
        SessionTokenError::MalformedToken
    }
}

impl From<jsonwebtoken::errors::Error> for SessionTokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => SessionTokenError::BadSignature,
            ErrorKind::ExpiredSignature => SessionTokenError::ExpiredToken,
            ErrorKind::ImmatureSignature => SessionTokenError::NotYetValid,
            ErrorKind::InvalidIssuer => SessionTokenError::InvalidIssuer,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                SessionTokenError::AlgorithmMismatch
            }
            _ => SessionTokenError::MalformedToken,
        }
    }
}

/// A freshly signed session token and its claims.
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

/// Issues and validates session tokens.
///
/// Holds only derived key material; cheap to share behind an `Arc`.
#[derive(Clone)]
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionTokenService {
    /// Create a service bound to `signing_key`.
    pub fn new(signing_key: &SigningKey) -> Self {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
            validation,
        }
    }

    /// Issue a session token valid from now for [`SESSION_TTL_SECONDS`].
    ///
    /// # Errors
    ///
    /// - `EmptySubject` - `subject_id` is empty
    /// - `Signing` - the token could not be encoded
    pub fn issue(
        &self,
        subject_id: &str,
        email: &str,
        display_name: &str,
    ) -> Result<String, SessionIssueError> {
        self.issue_at(subject_id, email, display_name, Utc::now())
    }

    /// Issue a session token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// See [`SessionTokenService::issue`].
    pub fn issue_at(
        &self,
        subject_id: &str,
        email: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<String, SessionIssueError> {
        self.mint_at(subject_id, email, display_name, now)
            .map(|session| session.token)
    }

    /// Issue a session token and return it with the claims it carries.
    ///
    /// # Errors
    ///
    /// See [`SessionTokenService::issue`].
    pub fn mint_at(
        &self,
        subject_id: &str,
        email: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, SessionIssueError> {
        if subject_id.is_empty() {
            return Err(SessionIssueError::EmptySubject);
        }

        let issued_at = now.timestamp();
        let claims = SessionClaims {
            subject_id: subject_id.to_string(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            issued_at,
            not_before: issued_at,
            expires_at: issued_at + SESSION_TTL_SECONDS,
            issuer: SESSION_ISSUER.to_string(),
        };

        let token = encode(&Header::new(SESSION_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!(target: "gw.auth.session", error = %e, "Failed to sign session token");
                SessionIssueError::Signing(e.to_string())
            })?;

        Ok(IssuedSession { token, claims })
    }

    /// Validate a session token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionTokenError`] kind describing why the token was
    /// rejected.
    #[instrument(skip_all, name = "gw.auth.session.validate")]
    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        let alg = extract_alg(token)?;
        if alg != SESSION_ALGORITHM_NAME {
            tracing::debug!(
                target: "gw.auth.session",
                alg = %alg,
                "Session token rejected: unexpected algorithm"
            );
            return Err(SessionTokenError::AlgorithmMismatch);
        }

        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(target: "gw.auth.session", error = %e, "Session token verification failed");
                SessionTokenError::from(e)
            })?;

        Ok(token_data.claims)
    }
}

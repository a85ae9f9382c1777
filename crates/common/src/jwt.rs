//! JWT utilities shared across Brainiac services.
//!
//! This module provides the pre-verification checks applied to every
//! session token before any cryptographic work is done:
//! - Size limits for DoS prevention
//! - Algorithm extraction from the JWT header
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - The header is inspected without trusting it; the caller decides which
//!   algorithm is acceptable and MUST still verify the signature
//! - Generic error messages prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{extract_alg, MAX_JWT_SIZE_BYTES};
//!
//! let alg = extract_alg(token)?;
//! if alg != "HS256" {
//!     return Err(AlgorithmMismatch);
//! }
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this size are rejected BEFORE any parsing or cryptographic
/// operations.
///
/// - Typical session tokens are 250-400 bytes (HS256 sig, identity claims)
/// - 8KB allows for long display names while preventing abuse
/// - Checked BEFORE base64 decode and signature verification
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while inspecting a JWT before verification.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The session token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The session token is invalid or expired")]
    MalformedToken,

    /// Token header has no usable `alg` member.
    #[error("The session token is invalid or expired")]
    MissingAlgorithm,
}

// =============================================================================
// Functions
// =============================================================================

/// Reject tokens above [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `JwtValidationError::TokenTooLarge` for oversized tokens.
pub fn check_token_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}

/// Extract the `alg` member from a JWT header without verifying the signature.
///
/// The value is returned verbatim (including `"none"`), so the caller can
/// distinguish an algorithm substitution attempt from a structurally broken
/// token.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing
/// - This function does NOT validate the token signature
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds size limit
/// - `MalformedToken` - Wrong number of segments, empty segments, bad base64,
///   or a header that is not a JSON object
/// - `MissingAlgorithm` - Header has no `alg`, or `alg` is not a non-empty string
pub fn extract_alg(token: &str) -> Result<String, JwtValidationError> {
    check_token_size(token)?;

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    // Header and payload must be present; the signature may legitimately be
    // empty for unsecured ("none") tokens, which are classified by `alg`.
    if parts.iter().take(2).any(|p| p.is_empty()) {
        tracing::debug!(target: "common.jwt", "Token rejected: empty segment");
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    // Unknown header members are ignored
    let header = header.as_object().ok_or_else(|| {
        tracing::debug!(target: "common.jwt", "JWT header is not a JSON object");
        JwtValidationError::MalformedToken
    })?;

    header
        .get("alg")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingAlgorithm)
}

// =============================================================================
// Tests
// =============================================================================

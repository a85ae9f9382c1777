//! Session authentication for the Brainiac Gateway.
//!
//! - `signing_key` - Process-wide HS256 signing secret
//! - `session` - Session token issuance and validation

pub mod session;
pub mod signing_key;

pub use session::{
    IssuedSession, SessionClaims, SessionIssueError, SessionTokenError, SessionTokenService, SESSION_ISSUER,
    SESSION_TTL_SECONDS,
};
pub use signing_key::{SigningKey, DEV_DEFAULT_SIGNING_SECRET};

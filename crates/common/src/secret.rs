//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports types from the [`secrecy`] crate. Every credential that passes
//! through the gateway is wrapped in one of these:
//!
//! - the session signing secret
//! - the provider app secret
//! - provider access tokens held longer than a single call
//!
//! `SecretString` implements `Debug` with redaction, so a struct deriving
//! `Debug` that holds a secret is safe to log. The value is zeroized on drop
//! and is only reachable through `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct AppCredentials {
//!     app_id: String,
//!     app_secret: SecretString,
//! }
//!
//! let creds = AppCredentials {
//!     app_id: "1234".to_string(),
//!     app_secret: SecretString::from("shh"),
//! };
//!
//! assert!(!format!("{creds:?}").contains("shh"));
//! assert_eq!(creds.app_secret.expose_secret(), "shh");
//! ```

pub use secrecy::{ExposeSecret, SecretString};

//! Signing key store.
//!
//! Holds the secret used to sign and verify session tokens. The key is
//! built once at startup and handed to the session token service by value;
//! there is no global key.

use crate::config::Config;
use common::secret::{ExposeSecret, SecretString};
use std::fmt;

/// Development fallback used when `JWT_SECRET` is not configured.
///
/// Anyone who knows this value can forge sessions; `main` logs a warning
/// whenever it is in effect.
pub const DEV_DEFAULT_SIGNING_SECRET: &str = "your-secret-key-change-in-production";

/// HS256 signing secret.
#[derive(Clone)]
pub struct SigningKey {
    secret: SecretString,
    insecure_default: bool,
}

impl SigningKey {
    /// Wrap an explicitly configured secret.
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            insecure_default: false,
        }
    }

    /// The well-known development secret.
    pub fn insecure_development_default() -> Self {
        Self {
            secret: SecretString::from(DEV_DEFAULT_SIGNING_SECRET),
            insecure_default: true,
        }
    }

    /// Build the key from configuration, falling back to the development
    /// default when no secret is configured.
    pub fn from_config(config: &Config) -> Self {
        match &config.jwt_secret {
            Some(secret) => Self::new(secret.clone()),
            None => Self::insecure_development_default(),
        }
    }

    /// True when the development fallback is in use.
    pub fn is_insecure_default(&self) -> bool {
        self.insecure_default
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("secret", &"[REDACTED]")
            .field("insecure_default", &self.insecure_default)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(jwt_secret: Option<&str>) -> Config {
        let mut vars = HashMap::from([
            ("FACEBOOK_APP_ID".to_string(), "app".to_string()),
            ("FACEBOOK_APP_SECRET".to_string(), "secret".to_string()),
        ]);
        if let Some(s) = jwt_secret {
            vars.insert("JWT_SECRET".to_string(), s.to_string());
        }
        Config::from_vars(&vars).unwrap()
    }

    #[test]
    fn test_from_config_uses_configured_secret() {
        let key = SigningKey::from_config(&config_with(Some("configured")));
        assert!(!key.is_insecure_default());
        assert_eq!(key.as_bytes(), b"configured");
    }

    #[test]
    fn test_from_config_falls_back_to_dev_default() {
        let key = SigningKey::from_config(&config_with(None));
        assert!(key.is_insecure_default());
        assert_eq!(key.as_bytes(), DEV_DEFAULT_SIGNING_SECRET.as_bytes());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let key = SigningKey::new(SecretString::from("do-not-print"));
        let debug_output = format!("{:?}", key);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("do-not-print"));
    }
}

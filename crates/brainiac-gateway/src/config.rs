//! Brainiac Gateway configuration.
//!
//! Configuration is loaded from environment variables. All sensitive
//! fields are redacted in Debug output.

use axum::http::HeaderValue;
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind host.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default Graph API base URL (pinned API version).
pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com/v18.0";

/// Default timeout for a single Graph API call in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for `PROVIDER_TIMEOUT_SECONDS`.
pub const MAX_PROVIDER_TIMEOUT_SECONDS: u64 = 60;

/// Default CORS origin (any).
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

/// Default graceful shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 0;

/// Upper bound for `DRAIN_SECONDS`.
pub const MAX_DRAIN_SECONDS: u64 = 300;

/// Brainiac Gateway configuration.
///
/// Loaded from environment variables with sensible defaults.
/// The signing secret and the Facebook app secret are redacted in Debug output.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Session token signing secret. `None` when `JWT_SECRET` is unset or
    /// empty, in which case the insecure development default is used.
    pub jwt_secret: Option<SecretString>,

    /// Facebook application id.
    pub facebook_app_id: String,

    /// Facebook application secret.
    pub facebook_app_secret: SecretString,

    /// Graph API base URL without trailing slash.
    pub facebook_graph_url: String,

    /// Timeout for a single Graph API call in seconds.
    pub provider_timeout_seconds: u64,

    /// Allowed CORS origin (`*` for any).
    pub cors_allowed_origin: String,

    /// Graceful shutdown drain period in seconds.
    pub drain_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field(
                "jwt_secret",
                &self.jwt_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("facebook_app_id", &self.facebook_app_id)
            .field("facebook_app_secret", &"[REDACTED]")
            .field("facebook_graph_url", &self.facebook_graph_url)
            .field("provider_timeout_seconds", &self.provider_timeout_seconds)
            .field("cors_allowed_origin", &self.cors_allowed_origin)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid port configuration: {0}")]
    InvalidPort(String),

    #[error("Invalid provider timeout configuration: {0}")]
    InvalidProviderTimeout(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainPeriod(String),

    #[error("Invalid Graph API URL: {0}")]
    InvalidGraphUrl(String),

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("Invalid bind host: {0}")]
    InvalidBindHost(String),
}

/// Look up a variable, treating an empty value as absent.
fn non_empty<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a String> {
    vars.get(key).filter(|v| !v.trim().is_empty())
}

fn required(vars: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    non_empty(vars, key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let facebook_app_id = required(vars, "FACEBOOK_APP_ID")?;
        let facebook_app_secret = SecretString::from(required(vars, "FACEBOOK_APP_SECRET")?);

        let jwt_secret = non_empty(vars, "JWT_SECRET").map(|s| SecretString::from(s.clone()));

        // Parse port with validation
        let port = if let Some(value_str) = non_empty(vars, "PORT") {
            let value: u16 = value_str.parse().map_err(|e| {
                ConfigError::InvalidPort(format!(
                    "PORT must be an integer in 1..=65535, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidPort(
                    "PORT must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_PORT
        };

        let bind_host = non_empty(vars, "BIND_HOST")
            .map(|s| s.trim())
            .unwrap_or(DEFAULT_BIND_HOST);
        let bind_ip: IpAddr = bind_host.parse().map_err(|e| {
            ConfigError::InvalidBindHost(format!(
                "BIND_HOST must be an IPv4 or IPv6 address, got '{}': {}",
                bind_host, e
            ))
        })?;
        // IPv6 hosts render bracketed, e.g. "[::]:8080"
        let bind_address = SocketAddr::new(bind_ip, port).to_string();

        let facebook_graph_url = non_empty(vars, "FACEBOOK_GRAPH_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GRAPH_URL.to_string());

        if !(facebook_graph_url.starts_with("https://")
            || facebook_graph_url.starts_with("http://"))
        {
            return Err(ConfigError::InvalidGraphUrl(format!(
                "FACEBOOK_GRAPH_URL must be an http(s) URL, got '{}'",
                facebook_graph_url
            )));
        }

        // Parse provider timeout with validation
        let provider_timeout_seconds =
            if let Some(value_str) = non_empty(vars, "PROVIDER_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidProviderTimeout(format!(
                        "PROVIDER_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 || value > MAX_PROVIDER_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidProviderTimeout(format!(
                        "PROVIDER_TIMEOUT_SECONDS must be in 1..={}, got {}",
                        MAX_PROVIDER_TIMEOUT_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_PROVIDER_TIMEOUT_SECONDS
            };

        let cors_allowed_origin = non_empty(vars, "CORS_ALLOWED_ORIGIN")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGIN.to_string());

        if cors_allowed_origin != "*" && HeaderValue::from_str(&cors_allowed_origin).is_err() {
            return Err(ConfigError::InvalidCorsOrigin(format!(
                "CORS_ALLOWED_ORIGIN is not a valid header value: '{}'",
                cors_allowed_origin
            )));
        }

        // Parse drain period with validation
        let drain_seconds = if let Some(value_str) = non_empty(vars, "DRAIN_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainPeriod(format!(
                    "DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value > MAX_DRAIN_SECONDS {
                return Err(ConfigError::InvalidDrainPeriod(format!(
                    "DRAIN_SECONDS must not exceed {} seconds, got {}",
                    MAX_DRAIN_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_DRAIN_SECONDS
        };

        Ok(Config {
            bind_address,
            jwt_secret,
            facebook_app_id,
            facebook_app_secret,
            facebook_graph_url,
            provider_timeout_seconds,
            cors_allowed_origin,
            drain_seconds,
        })
    }
}

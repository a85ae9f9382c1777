//! Facebook Graph API client.
//!
//! Verifies provider tokens presented at login and proxies the page listing
//! and page posting calls used by the client app.
//!
//! Verification is two strictly sequential calls, both of which must succeed:
//!
//! 1. `GET /debug_token` with the app credential confirms the token is valid,
//!    was minted for this app, and yields the provider-scoped user id
//! 2. `GET /{user_id}?fields=id,name,email` with the user's token fetches the
//!    profile
//!
//! # Security
//!
//! - Provider tokens and the app secret are never logged
//! - Every call is bounded by the configured timeout; there are no retries
//! - Response schemas are explicit; missing required fields fail closed
//! - Provider detail is logged server-side only

use crate::config::Config;
use crate::models::IdentityClaims;
use crate::observability::metrics::record_provider_request;
use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, instrument, warn};

/// Connect timeout for Graph API calls.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Longest Graph object id accepted as a URL path segment.
const MAX_GRAPH_ID_LEN: usize = 128;

/// Failure kinds for Graph API calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Transport failure, timeout, or 5xx from the provider.
    #[error("Identity provider is unreachable")]
    ProviderUnreachable,

    /// The provider answered with an error object.
    #[error("Identity provider rejected the request: {0}")]
    ProviderRejected(String),

    /// The provider token is not valid for this application.
    #[error("Provider token is invalid")]
    InvalidExternalToken,

    /// The provider answered with a body that does not match the schema.
    #[error("Identity provider returned an unexpected response")]
    MalformedProviderResponse,
}

impl VerificationError {
    /// Bounded label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationError::ProviderUnreachable => "unreachable",
            VerificationError::ProviderRejected(_) => "rejected",
            VerificationError::InvalidExternalToken => "invalid_token",
            VerificationError::MalformedProviderResponse => "malformed_response",
        }
    }
}

/// Identity provider seam.
///
/// Handlers depend on this trait only, so tests can substitute a fixed
/// provider without a Graph API mock.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a provider token and return the identity it belongs to.
    async fn validate_external_token(
        &self,
        provider_token: &str,
    ) -> Result<IdentityClaims, VerificationError>;

    /// List the pages the token's user manages. Page objects are returned
    /// as the provider sent them.
    async fn list_pages(&self, user_token: &str)
        -> Result<Vec<serde_json::Value>, VerificationError>;

    /// Publish `message` to a page feed and return the new post id.
    async fn post_to_page(
        &self,
        page_id: &str,
        page_token: &str,
        message: &str,
    ) -> Result<String, VerificationError>;
}

/// True when `id` is safe to use as a Graph API path segment.
pub fn is_valid_graph_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_GRAPH_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ============================================================================
// Graph API response schemas
// ============================================================================

/// Error object the Graph API attaches to failed calls.
#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

impl GraphErrorBody {
    fn into_rejection(self, operation: &'static str) -> VerificationError {
        warn!(
            target: "gw.services.facebook",
            operation,
            error_type = self.kind.as_deref().unwrap_or("unknown"),
            error_code = self.code.unwrap_or_default(),
            message = self.message.as_deref().unwrap_or(""),
            "Graph API returned an error"
        );
        VerificationError::ProviderRejected(
            self.message
                .unwrap_or_else(|| "unspecified provider error".to_string()),
        )
    }
}

#[derive(Debug, Deserialize)]
struct DebugTokenResponse {
    data: Option<DebugTokenData>,
    error: Option<GraphErrorBody>,
}

#[derive(Debug, Deserialize)]
struct DebugTokenData {
    is_valid: Option<bool>,
    user_id: Option<String>,
    app_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    error: Option<GraphErrorBody>,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    data: Option<Vec<serde_json::Value>>,
    error: Option<GraphErrorBody>,
}

#[derive(Debug, Deserialize)]
struct FeedPostResponse {
    id: Option<String>,
    error: Option<GraphErrorBody>,
}

// ============================================================================
// Client
// ============================================================================

/// Graph API client.
#[derive(Clone)]
pub struct FacebookClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Graph API base URL without trailing slash.
    graph_url: String,

    /// Facebook application id.
    app_id: String,

    /// Facebook application secret.
    app_secret: SecretString,
}

impl FacebookClient {
    /// Create a new Graph API client.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn new(
        graph_url: String,
        app_id: String,
        app_secret: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                error!(target: "gw.services.facebook", error = %e, "Failed to build HTTP client");
                e
            })?;

        Ok(Self {
            client,
            graph_url,
            app_id,
            app_secret,
        })
    }

    /// Create a client from service configuration.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.facebook_graph_url.clone(),
            config.facebook_app_id.clone(),
            config.facebook_app_secret.clone(),
            Duration::from_secs(config.provider_timeout_seconds),
        )
    }

    /// App access token in the `{app_id}|{app_secret}` form.
    fn app_access_token(&self) -> SecretString {
        SecretString::from(format!(
            "{}|{}",
            self.app_id,
            self.app_secret.expose_secret()
        ))
    }

    /// Send a request, record metrics, and parse the body as `T`.
    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, VerificationError> {
        let start = Instant::now();
        let result = send_and_parse(operation, request).await;
        let status = match &result {
            Ok(_) => "success",
            Err(e) => e.as_str(),
        };
        record_provider_request(operation, status, start.elapsed());
        result
    }

    async fn debug_token(&self, provider_token: &str) -> Result<String, VerificationError> {
        let app_token = self.app_access_token();
        let request = self
            .client
            .get(format!("{}/debug_token", self.graph_url))
            .query(&[
                ("input_token", provider_token),
                ("access_token", app_token.expose_secret()),
            ]);

        let response: DebugTokenResponse = self.call("debug_token", request).await?;

        if let Some(err) = response.error {
            return Err(err.into_rejection("debug_token"));
        }

        // A missing data object counts as is_valid absent
        let Some(data) = response.data.filter(|d| d.is_valid == Some(true)) else {
            tracing::debug!(target: "gw.services.facebook", "Provider token reported invalid");
            return Err(VerificationError::InvalidExternalToken);
        };

        if let Some(app_id) = data.app_id.as_deref() {
            if app_id != self.app_id {
                warn!(
                    target: "gw.services.facebook",
                    "Provider token was issued for a different application"
                );
                return Err(VerificationError::InvalidExternalToken);
            }
        }

        let subject_id = data.user_id.unwrap_or_default();
        if !is_valid_graph_id(&subject_id) {
            warn!(
                target: "gw.services.facebook",
                "Provider token introspection returned an unusable user id"
            );
            return Err(VerificationError::InvalidExternalToken);
        }

        Ok(subject_id)
    }

    async fn fetch_profile(
        &self,
        subject_id: &str,
        provider_token: &str,
    ) -> Result<IdentityClaims, VerificationError> {
        let request = self
            .client
            .get(format!("{}/{}", self.graph_url, subject_id))
            .query(&[
                ("fields", "id,name,email"),
                ("access_token", provider_token),
            ]);

        let profile: ProfileResponse = self.call("profile", request).await?;

        if let Some(err) = profile.error {
            return Err(err.into_rejection("profile"));
        }

        let (Some(id), Some(name)) = (profile.id, profile.name) else {
            warn!(target: "gw.services.facebook", "Profile response is missing id or name");
            return Err(VerificationError::MalformedProviderResponse);
        };

        if id != subject_id {
            warn!(
                target: "gw.services.facebook",
                "Profile id does not match the introspected user"
            );
            return Err(VerificationError::InvalidExternalToken);
        }

        Ok(IdentityClaims {
            subject_id: id,
            display_name: name,
            email: profile.email.filter(|e| !e.is_empty()),
        })
    }
}

/// Execute a Graph API request and decode the body.
///
/// 4xx bodies are decoded too: the Graph API reports rejections as an
/// `error` object, which the caller inspects.
async fn send_and_parse<T: DeserializeOwned>(
    operation: &'static str,
    request: RequestBuilder,
) -> Result<T, VerificationError> {
    let response = request.send().await.map_err(|e| {
        warn!(
            target: "gw.services.facebook",
            operation,
            timeout = e.is_timeout(),
            error = %e.without_url(),
            "Graph API request failed"
        );
        VerificationError::ProviderUnreachable
    })?;

    let status = response.status();
    if status.is_server_error() {
        warn!(
            target: "gw.services.facebook",
            operation,
            status = %status,
            "Graph API returned server error"
        );
        return Err(VerificationError::ProviderUnreachable);
    }

    let body = response.bytes().await.map_err(|e| {
        warn!(
            target: "gw.services.facebook",
            operation,
            timeout = e.is_timeout(),
            error = %e.without_url(),
            "Failed to read Graph API response"
        );
        VerificationError::ProviderUnreachable
    })?;

    serde_json::from_slice(&body).map_err(|e| {
        warn!(
            target: "gw.services.facebook",
            operation,
            status = %status,
            error = %e,
            "Failed to parse Graph API response"
        );
        VerificationError::MalformedProviderResponse
    })
}

#[async_trait]
impl IdentityProvider for FacebookClient {
    #[instrument(skip_all, name = "gw.services.facebook.validate_external_token")]
    async fn validate_external_token(
        &self,
        provider_token: &str,
    ) -> Result<IdentityClaims, VerificationError> {
        let subject_id = self.debug_token(provider_token).await?;
        self.fetch_profile(&subject_id, provider_token).await
    }

    #[instrument(skip_all, name = "gw.services.facebook.list_pages")]
    async fn list_pages(
        &self,
        user_token: &str,
    ) -> Result<Vec<serde_json::Value>, VerificationError> {
        let request = self
            .client
            .get(format!("{}/me/accounts", self.graph_url))
            .query(&[("access_token", user_token)]);

        let response: AccountsResponse = self.call("accounts", request).await?;

        if let Some(err) = response.error {
            return Err(err.into_rejection("accounts"));
        }

        response.data.ok_or_else(|| {
            warn!(target: "gw.services.facebook", "Accounts response has no data array");
            VerificationError::MalformedProviderResponse
        })
    }

    #[instrument(skip_all, name = "gw.services.facebook.post_to_page")]
    async fn post_to_page(
        &self,
        page_id: &str,
        page_token: &str,
        message: &str,
    ) -> Result<String, VerificationError> {
        if !is_valid_graph_id(page_id) {
            return Err(VerificationError::ProviderRejected(
                "invalid page id".to_string(),
            ));
        }

        let request = self
            .client
            .post(format!("{}/{}/feed", self.graph_url, page_id))
            .query(&[("message", message), ("access_token", page_token)]);

        let response: FeedPostResponse = self.call("feed_post", request).await?;

        if let Some(err) = response.error {
            return Err(err.into_rejection("feed_post"));
        }

        response.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            warn!(target: "gw.services.facebook", "Feed post response has no id");
            VerificationError::MalformedProviderResponse
        })
    }
}

//! Test server harness for E2E testing
//!
//! Provides `TestGatewayServer` for spawning real gateway instances in tests.

use crate::{TEST_APP_ID, TEST_APP_SECRET, TEST_SIGNING_SECRET};
use brainiac_gateway::auth::{SessionTokenService, SigningKey};
use brainiac_gateway::config::Config;
use brainiac_gateway::routes::{self, init_metrics_recorder, AppState};
use brainiac_gateway::services::FacebookClient;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle for test servers.
///
/// The Prometheus recorder can be installed once per process; every server
/// spawned in the same test binary shares it.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics handle shared by all test servers in this process.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the gateway in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<()> {
///     let graph = MockGraphApi::start().await;
///     let server = TestGatewayServer::spawn(&graph.uri()).await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestGatewayServer {
    addr: SocketAddr,
    session_tokens: Arc<SessionTokenService>,
    _handle: JoinHandle<()>,
}

impl TestGatewayServer {
    /// Spawn a gateway whose Graph API base URL is `graph_url`.
    ///
    /// The server binds to a random port on 127.0.0.1 and signs sessions with
    /// [`TEST_SIGNING_SECRET`].
    pub async fn spawn(graph_url: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(graph_url, &[]).await
    }

    /// Spawn a gateway with extra environment variables layered on top of
    /// the test defaults.
    pub async fn spawn_with_vars(
        graph_url: &str,
        extra_vars: &[(&str, &str)],
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("FACEBOOK_APP_ID".to_string(), TEST_APP_ID.to_string()),
            ("FACEBOOK_APP_SECRET".to_string(), TEST_APP_SECRET.to_string()),
            ("FACEBOOK_GRAPH_URL".to_string(), graph_url.to_string()),
            ("JWT_SECRET".to_string(), TEST_SIGNING_SECRET.to_string()),
            ("BIND_HOST".to_string(), "127.0.0.1".to_string()),
            ("PROVIDER_TIMEOUT_SECONDS".to_string(), "5".to_string()),
        ]);
        for (key, value) in extra_vars {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let session_tokens = Arc::new(SessionTokenService::new(&SigningKey::from_config(
            &config,
        )));
        let facebook_client = FacebookClient::from_config(&config)
            .map_err(|e| anyhow::anyhow!("Failed to build Graph API client: {}", e))?;

        let state = Arc::new(AppState {
            config,
            session_tokens: session_tokens.clone(),
            identity_provider: Arc::new(facebook_client),
        });

        // Build routes using the gateway's real route builder
        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            session_tokens,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Session token service bound to the server's signing key.
    pub fn session_tokens(&self) -> &SessionTokenService {
        &self.session_tokens
    }
}

impl Drop for TestGatewayServer {
    fn drop(&mut self) {
        // Abort the server task so ports are released between tests
        self._handle.abort();
    }
}

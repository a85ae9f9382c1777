//! Brainiac Gateway
//!
//! Entry point for the Brainiac backend. Verifies Facebook logins, issues
//! session tokens, and gates the authenticated API.

use anyhow::Context;
use brainiac_gateway::auth::{SessionTokenService, SigningKey};
use brainiac_gateway::config::Config;
use brainiac_gateway::observability::metrics::init_metrics_recorder;
use brainiac_gateway::routes::{self, AppState};
use brainiac_gateway::services::FacebookClient;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brainiac_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Brainiac Gateway");

    let config = Config::from_env().context("Invalid gateway configuration")?;

    info!(
        bind_address = %config.bind_address,
        graph_url = %config.facebook_graph_url,
        provider_timeout_seconds = config.provider_timeout_seconds,
        "Gateway configured"
    );

    let signing_key = SigningKey::from_config(&config);
    if signing_key.is_insecure_default() {
        warn!(
            "JWT_SECRET is not set; using the insecure development signing secret. \
             Anyone can forge sessions. Set JWT_SECRET in production."
        );
    }
    let session_tokens = Arc::new(SessionTokenService::new(&signing_key));

    let facebook_client =
        FacebookClient::from_config(&config).context("Failed to build Graph API client")?;

    // Initialize metrics before any are recorded
    let metrics_handle = init_metrics_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to initialize metrics: {e}"))?;

    let bind_address = config.bind_address.clone();
    let drain_seconds = config.drain_seconds;

    let state = Arc::new(AppState {
        config,
        session_tokens,
        identity_provider: Arc::new(facebook_client),
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {bind_address}"))?;

    info!("Brainiac Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(drain_seconds))
        .await?;

    info!("Brainiac Gateway shutdown complete");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM, after the configured drain period.
async fn shutdown_signal(drain_seconds: u64) {
    let signal_name = wait_for_signal().await;
    info!(signal = signal_name, "Shutdown signal received");

    if drain_seconds > 0 {
        warn!(drain_seconds, "Draining in-flight requests before exit");
        tokio::time::sleep(Duration::from_secs(drain_seconds)).await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use signal::unix::{signal as unix_signal, SignalKind};

    let mut sigterm = match unix_signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, "Cannot install SIGTERM handler; only SIGINT will stop the gateway");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        name = wait_for_ctrl_c() => name,
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> &'static str {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for SIGINT");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

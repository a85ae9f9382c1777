//! Integration tests for operational endpoints.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use gateway_test_utils::{MockGraphApi, TestGatewayServer};

#[tokio::test]
async fn test_health_endpoint_returns_ok_and_version() -> Result<()> {
    let graph = MockGraphApi::start().await;
    let server = TestGatewayServer::spawn(&graph.uri()).await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    Ok(())
}

#[tokio::test]
async fn test_health_does_not_touch_provider() -> Result<()> {
    let graph = MockGraphApi::start().await;
    graph.mock_unavailable().await;
    let server = TestGatewayServer::spawn(&graph.uri()).await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), 200);
    assert!(graph.server().received_requests().await.unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_http_metrics() -> Result<()> {
    let graph = MockGraphApi::start().await;
    let server = TestGatewayServer::spawn(&graph.uri()).await?;
    let client = reqwest::Client::new();

    client
        .get(format!("{}/health", server.url()))
        .send()
        .await?;

    let response = client
        .get(format!("{}/metrics", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body = response.text().await?;
    assert!(
        body.contains("gw_http_requests_total"),
        "metrics should include HTTP counters, got: {body}"
    );
    assert!(body.contains("endpoint=\"/health\""));

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_404() -> Result<()> {
    let graph = MockGraphApi::start().await;
    let server = TestGatewayServer::spawn(&graph.uri()).await?;

    let response = reqwest::get(format!("{}/api/ollama/prompt", server.url())).await?;

    assert_eq!(response.status(), 404);

    Ok(())
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin_by_default() -> Result<()> {
    let graph = MockGraphApi::start().await;
    let server = TestGatewayServer::spawn(&graph.uri()).await?;

    let response = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/api/facebook/auth", server.url()),
        )
        .header("Origin", "https://app.example.com")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await?;

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );

    Ok(())
}

#[tokio::test]
async fn test_cors_exact_origin() -> Result<()> {
    let graph = MockGraphApi::start().await;
    let server = TestGatewayServer::spawn_with_vars(
        &graph.uri(),
        &[("CORS_ALLOWED_ORIGIN", "https://app.brainiac.test")],
    )
    .await?;

    let response = reqwest::Client::new()
        .get(format!("{}/health", server.url()))
        .header("Origin", "https://app.brainiac.test")
        .send()
        .await?;

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "https://app.brainiac.test"
    );

    Ok(())
}

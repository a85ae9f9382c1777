//! Session gate integration tests.
//!
//! Exercises `/api/v1/me` with missing, malformed and forged session tokens.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use chrono::Utc;
use gateway_test_utils::{ForgedTokenBuilder, MockGraphApi, TestGatewayServer};

async fn get_me(server: &TestGatewayServer, authorization: Option<&str>) -> Result<reqwest::Response> {
    let mut request = reqwest::Client::new().get(format!("{}/api/v1/me", server.url()));
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    Ok(request.send().await?)
}

async fn assert_rejected(response: reqwest::Response, code: &str) -> Result<serde_json::Value> {
    assert_eq!(response.status(), 401);
    assert!(response
        .headers()
        .get("www-authenticate")
        .unwrap()
        .to_str()?
        .starts_with("Bearer realm=\"brainiac-api\""));
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], code);
    Ok(body)
}

#[tokio::test]
async fn test_forged_hs256_with_server_secret_is_admitted() -> Result<()> {
    let graph = MockGraphApi::start().await;
    let server = TestGatewayServer::spawn(&graph.uri()).await?;
    let token = ForgedTokenBuilder::new().subject("777").sign_hs256();

    let response = get_me(&server, Some(&format!("Bearer {token}"))).await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["id"], "777");

    Ok(())
}

#[tokio::test]
async fn test_missing_header_is_distinct() -> Result<()> {
    let graph = MockGraphApi::start().await;
    let server = TestGatewayServer::spawn(&graph.uri()).await?;

    assert_rejected(get_me(&server, None).await?, "MISSING_AUTHORIZATION").await?;

    Ok(())
}

#[tokio::test]
async fn test_malformed_headers_are_distinct() -> Result<()> {
    let graph = MockGraphApi::start().await;
    let server = TestGatewayServer::spawn(&graph.uri()).await?;
    let token = ForgedTokenBuilder::new().sign_hs256();

    for value in [
        token.clone(),
        format!("Basic {token}"),
        format!("Bearer {token} trailing"),
    ] {
        assert_rejected(get_me(&server, Some(&value)).await?, "MALFORMED_AUTHORIZATION").await?;
    }

    Ok(())
}

#[tokio::test]
async fn test_forged_tokens_are_invalid_session() -> Result<()> {
    let graph = MockGraphApi::start().await;
    let server = TestGatewayServer::spawn(&graph.uri()).await?;
    let now = Utc::now().timestamp();
    let base = ForgedTokenBuilder::new();

    let forged = [
        ("wrong secret", base.clone().secret("another-secret").sign_hs256()),
        ("alg none", base.unsigned()),
        ("hs512", base.sign_hs512()),
        ("eddsa", base.sign_eddsa()),
        ("rs256 header", base.with_raw_header(r#"{"alg":"RS256","typ":"JWT"}"#)),
        (
            "expired",
            base.clone().issued_at(now - 90_000).expires_at(now - 3_600).sign_hs256(),
        ),
        ("not yet valid", base.clone().not_before(now + 3_600).sign_hs256()),
        ("wrong issuer", base.clone().issuer("evil-backend").sign_hs256()),
        ("missing exp", base.clone().without_claim("exp").sign_hs256()),
        ("garbage", "a.b.c".to_string()),
    ];

    let mut bodies = Vec::new();
    for (name, token) in forged {
        let response = get_me(&server, Some(&format!("Bearer {token}"))).await?;
        assert_eq!(response.status(), 401, "{name} should be rejected");
        bodies.push(assert_rejected(response, "INVALID_SESSION").await?);
    }

    // Clients cannot tell the failure kinds apart
    let first = bodies.first().unwrap();
    assert!(bodies.iter().all(|b| b == first));

    Ok(())
}

#[tokio::test]
async fn test_session_gate_never_calls_provider() -> Result<()> {
    let graph = MockGraphApi::start().await;
    let server = TestGatewayServer::spawn(&graph.uri()).await?;
    let token = ForgedTokenBuilder::new().sign_hs256();

    get_me(&server, Some(&format!("Bearer {token}"))).await?;
    get_me(&server, Some("Bearer nope")).await?;

    assert!(graph.server().received_requests().await.unwrap().is_empty());

    Ok(())
}

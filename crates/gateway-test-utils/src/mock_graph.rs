//! Graph API mock for E2E testing.
//!
//! Wraps a wiremock `MockServer` with canned Graph API responses for the
//! calls the gateway makes: `debug_token`, the profile lookup,
//! `me/accounts` and page feed posts.

use crate::{TEST_APP_ID, TEST_APP_SECRET};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A Facebook user known to the mock.
#[derive(Debug, Clone)]
pub struct GraphUser {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

impl GraphUser {
    pub fn new(id: &str, name: &str, email: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.map(str::to_string),
        }
    }

    /// A user with a populated email address.
    pub fn ada() -> Self {
        Self::new("10001", "Ada Lovelace", Some("ada@example.com"))
    }
}

/// Graph API mock server.
pub struct MockGraphApi {
    server: MockServer,
}

impl MockGraphApi {
    /// Start a new mock server on a random port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure as `FACEBOOK_GRAPH_URL`.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Underlying wiremock server for custom mocks.
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    fn app_access_token() -> String {
        format!("{TEST_APP_ID}|{TEST_APP_SECRET}")
    }

    async fn mount_introspection(&self, token: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path("/debug_token"))
            .and(query_param("input_token", token))
            .and(query_param("access_token", Self::app_access_token()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// `token` introspects as valid for `user` and the profile lookup succeeds.
    pub async fn mock_valid_user(&self, token: &str, user: &GraphUser) {
        self.mount_introspection(
            token,
            json!({"data": {"is_valid": true, "user_id": user.id, "app_id": TEST_APP_ID}}),
        )
        .await;

        let mut profile = json!({"id": user.id, "name": user.name});
        if let Some(email) = &user.email {
            profile["email"] = json!(email);
        }

        Mock::given(method("GET"))
            .and(path(format!("/{}", user.id)))
            .and(query_param("fields", "id,name,email"))
            .and(query_param("access_token", token))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile))
            .mount(&self.server)
            .await;
    }

    /// `token` introspects as invalid. Any profile lookup fails the test.
    pub async fn mock_invalid_token(&self, token: &str) {
        self.mount_introspection(
            token,
            json!({"data": {
                "is_valid": false,
                "error": {"code": 190, "message": "Error validating access token: Session has expired"}
            }}),
        )
        .await;

        self.expect_no_profile_lookup().await;
    }

    /// Introspection answers with a provider error object.
    pub async fn mock_introspection_error(&self, token: &str, message: &str) {
        self.mount_introspection(
            token,
            json!({"error": {"message": message, "type": "OAuthException", "code": 190}}),
        )
        .await;
    }

    /// `token` introspects as valid for `user_id` but the profile lookup
    /// returns a provider error object.
    pub async fn mock_profile_error(&self, token: &str, user_id: &str, message: &str) {
        self.mount_introspection(
            token,
            json!({"data": {"is_valid": true, "user_id": user_id, "app_id": TEST_APP_ID}}),
        )
        .await;

        Mock::given(method("GET"))
            .and(path(format!("/{user_id}")))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                json!({"error": {"message": message, "type": "GraphMethodException", "code": 100}}),
            ))
            .mount(&self.server)
            .await;
    }

    /// Every Graph call answers 503.
    pub async fn mock_unavailable(&self) {
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.server)
            .await;
    }

    /// Introspection for `token` succeeds only after `delay`.
    pub async fn mock_slow_introspection(&self, token: &str, delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/debug_token"))
            .and(query_param("input_token", token))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"is_valid": true, "user_id": "10001"}}))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Fail the test (on drop) if any profile lookup is made.
    pub async fn expect_no_profile_lookup(&self) {
        Mock::given(method("GET"))
            .and(query_param("fields", "id,name,email"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// `me/accounts` for `token` returns `pages` as the `data` array.
    pub async fn mock_pages(&self, token: &str, pages: Value) {
        Mock::given(method("GET"))
            .and(path("/me/accounts"))
            .and(query_param("access_token", token))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": pages})))
            .mount(&self.server)
            .await;
    }

    /// A feed post to `page_id` with `page_token` returns `post_id`.
    pub async fn mock_feed_post(&self, page_id: &str, page_token: &str, post_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/{page_id}/feed")))
            .and(query_param("access_token", page_token))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": post_id})))
            .mount(&self.server)
            .await;
    }
}

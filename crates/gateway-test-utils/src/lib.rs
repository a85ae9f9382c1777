//! # Gateway Test Utilities
//!
//! Shared test utilities for the Brainiac Gateway.
//!
//! This crate provides:
//! - Server test harness (`TestGatewayServer` for E2E tests)
//! - Graph API mock (`MockGraphApi`, backed by wiremock)
//! - Session token forging (`ForgedTokenBuilder`) for negative tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let graph = MockGraphApi::start().await;
//!     let server = TestGatewayServer::spawn(&graph.uri()).await?;
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/health", server.url()))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod mock_graph;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use mock_graph::*;
pub use server_harness::*;
pub use token_builders::*;

/// Facebook app id configured on every test server.
pub const TEST_APP_ID: &str = "test-app-id";

/// Facebook app secret configured on every test server.
pub const TEST_APP_SECRET: &str = "test-app-secret";

/// Session signing secret configured on every test server.
pub const TEST_SIGNING_SECRET: &str = "test-signing-secret-0123456789";

//! Brainiac Gateway Service Library
//!
//! This library provides the HTTP backend for Brainiac. It brokers identity
//! between the Facebook Graph API and a first-party session token:
//!
//! - Provider token verification (introspection + profile fetch)
//! - Session token issuance and validation (HS256, 24h lifetime)
//! - Request gating on a valid session token for protected routes
//! - Thin proxies for listing and posting to the user's Facebook pages
//!
//! # Architecture
//!
//! The gateway follows the Handler -> Service pattern. It keeps no
//! persistent state: the session token is self-describing.
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> services/*.rs
//!                                                      -> auth/session.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Signing key and session token service
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Session gate and HTTP metrics middleware
//! - `models` - Data models
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Identity provider client (Facebook Graph API)

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;

//! HTTP request handlers for the Brainiac Gateway.

pub mod auth;
pub mod facebook;
pub mod health;
pub mod me;
pub mod metrics;

pub use auth::authenticate;
pub use facebook::{list_pages, post_to_page};
pub use health::health_check;
pub use me::get_me;
pub use metrics::metrics_handler;

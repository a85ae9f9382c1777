//! Service layer for the Brainiac Gateway.
//!
//! # Components
//!
//! - `facebook` - Identity provider verifier and Graph API proxy client

pub mod facebook;

pub use facebook::{is_valid_graph_id, FacebookClient, IdentityProvider, VerificationError};

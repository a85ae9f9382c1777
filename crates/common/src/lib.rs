//! Common utilities shared across Brainiac crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT pre-verification utilities (size limits, header inspection)
pub mod jwt;

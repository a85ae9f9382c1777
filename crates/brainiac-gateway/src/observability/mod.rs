//! Observability module for the Brainiac Gateway.
//!
//! Provides Prometheus metrics definitions and recording helpers.

pub mod metrics;

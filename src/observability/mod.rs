//! # Observability
//!
//! Prometheus metrics for the issuer controllers and the Origin CA client.
//! Structured logging is configured once in `main` through `tracing-subscriber`.

pub mod metrics;

pub use metrics::register_metrics;

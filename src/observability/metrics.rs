//! # Metrics
//!
//! Prometheus metrics for monitoring the issuer.
//!
//! ## Metrics Exposed
//!
//! - `origin_issuer_reconciliations_total{controller}` - Total number of reconciliations
//! - `origin_issuer_reconciliation_errors_total{controller}` - Reconciliations that returned an error
//! - `origin_issuer_reconciliation_duration_seconds{controller}` - Duration of reconciliations
//! - `origin_issuer_certificates_signed_total{request_type}` - Certificates issued by the Origin CA
//! - `origin_issuer_ca_requests_total{outcome}` - Origin CA signing requests by outcome
//! - `origin_issuer_ca_request_duration_seconds` - Duration of Origin CA signing requests
//! - `origin_issuer_provisioners` - Provisioners currently held in the collection

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounterVec, IntGauge, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "origin_issuer_reconciliations_total",
            "Total number of reconciliations by controller",
        ),
        &["controller"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "origin_issuer_reconciliation_errors_total",
            "Total number of reconciliation errors by controller",
        ),
        &["controller"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "origin_issuer_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["controller"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static CERTIFICATES_SIGNED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "origin_issuer_certificates_signed_total",
            "Total number of certificates issued by the Origin CA",
        ),
        &["request_type"],
    )
    .expect("Failed to create CERTIFICATES_SIGNED_TOTAL metric - this should never happen")
});

static CA_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "origin_issuer_ca_requests_total",
            "Total number of Origin CA signing requests by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create CA_REQUESTS_TOTAL metric - this should never happen")
});

static CA_REQUEST_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "origin_issuer_ca_request_duration_seconds",
            "Duration of Origin CA signing requests in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create CA_REQUEST_DURATION metric - this should never happen")
});

static PROVISIONERS: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "origin_issuer_provisioners",
        "Current number of provisioners held for ready issuers",
    )
    .expect("Failed to create PROVISIONERS metric - this should never happen")
});

/// Register all metrics with the exported registry
///
/// # Errors
/// Returns an error if a metric is registered twice
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(CERTIFICATES_SIGNED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CA_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CA_REQUEST_DURATION.clone()))?;
    REGISTRY.register(Box::new(PROVISIONERS.clone()))?;

    Ok(())
}

pub fn increment_reconciliations(controller: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[controller]).inc();
}

pub fn increment_reconciliation_errors(controller: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[controller])
        .inc();
}

pub fn observe_reconciliation_duration(controller: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[controller])
        .observe(duration);
}

pub fn increment_certificates_signed(request_type: &str) {
    CERTIFICATES_SIGNED_TOTAL
        .with_label_values(&[request_type])
        .inc();
}

pub fn increment_ca_requests(outcome: &str) {
    CA_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn observe_ca_request_duration(duration: f64) {
    CA_REQUEST_DURATION.observe(duration);
}

pub fn set_provisioners(count: usize) {
    PROVISIONERS.set(i64::try_from(count).unwrap_or(i64::MAX));
}

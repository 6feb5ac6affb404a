//! # Configuration
//!
//! Command line flags of the controller. Every flag can also be set through
//! the environment variable named next to it, which is how the deployment
//! manifests configure the controller.

use crate::constants::{
    DEFAULT_CA_REQUEST_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENT_RECONCILES, DEFAULT_METRICS_PORT,
    DEFAULT_RECONCILE_TIMEOUT_SECS,
};
use crate::controller::ReconcileOptions;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use thiserror::Error;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Text,
}

/// Origin CA issuer for cert-manager
#[derive(Debug, Clone, Parser)]
#[command(name = "origin-ca-issuer", version, about, long_about = None)]
pub struct ControllerOptions {
    /// Sign CertificateRequests without waiting for an approval controller
    #[arg(long, env = "DISABLE_APPROVED_CHECK")]
    pub disable_approved_check: bool,

    /// Maximum number of reconciliations running at once, per watched kind
    #[arg(long, env = "MAX_CONCURRENT_RECONCILES", default_value_t = DEFAULT_MAX_CONCURRENT_RECONCILES)]
    pub max_concurrent_reconciles: u16,

    /// Upper bound on a single reconciliation, in seconds
    #[arg(long, env = "RECONCILE_TIMEOUT_SECS", default_value_t = DEFAULT_RECONCILE_TIMEOUT_SECS)]
    pub reconcile_timeout_secs: u64,

    /// Timeout of a single Origin CA request, in seconds
    #[arg(long, env = "CA_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_CA_REQUEST_TIMEOUT_SECS)]
    pub ca_request_timeout_secs: u64,

    /// Override the scheme, host and port of the Origin CA API
    #[arg(long, env = "API_ENDPOINT")]
    pub api_endpoint: Option<String>,

    /// Port serving /metrics, /healthz and /readyz
    #[arg(long, env = "METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid option --{flag}: {reason}")]
pub struct InvalidOption {
    pub flag: &'static str,
    pub reason: &'static str,
}

impl ControllerOptions {
    /// # Errors
    /// Returns an error for zero concurrency or zero timeouts
    pub fn validate(&self) -> Result<(), InvalidOption> {
        if self.max_concurrent_reconciles == 0 {
            return Err(InvalidOption {
                flag: "max-concurrent-reconciles",
                reason: "must be at least 1",
            });
        }
        if self.reconcile_timeout_secs == 0 {
            return Err(InvalidOption {
                flag: "reconcile-timeout-secs",
                reason: "must be at least 1",
            });
        }
        if self.ca_request_timeout_secs == 0 {
            return Err(InvalidOption {
                flag: "ca-request-timeout-secs",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            disable_approved_check: self.disable_approved_check,
            reconcile_timeout: Duration::from_secs(self.reconcile_timeout_secs),
        }
    }

    #[must_use]
    pub fn ca_request_timeout(&self) -> Duration {
        Duration::from_secs(self.ca_request_timeout_secs)
    }
}

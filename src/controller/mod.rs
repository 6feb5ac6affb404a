//! # Controller
//!
//! Reconciliation logic for the issuer.
//!
//! - `issuer`: readiness state machine shared by `OriginIssuer` and `OriginClusterIssuer`
//! - `certificate_request`: gate sequence that signs `CertificateRequest`s
//! - `conditions`: condition bookkeeping
//! - `duration`: Go duration string parsing
//! - `backoff`: Fibonacci backoff for retries
//! - `clock`: time source for condition timestamps

pub mod backoff;
pub mod certificate_request;
pub mod clock;
pub mod conditions;
pub mod duration;
mod error;
pub mod issuer;

pub use certificate_request::reconcile_certificate_request;
pub use error::ReconcilerError;
pub use issuer::{reconcile_issuer, IssuerResource};

use crate::cfapi::Factory;
use crate::constants::DEFAULT_RECONCILE_TIMEOUT_SECS;
use crate::provisioners::Collection;
use crate::store::ObjectStore;
use backoff::BackoffState;
use clock::{Clock, SystemClock};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Behaviour switches for the reconcilers
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Sign requests without waiting for an `Approved` condition
    pub disable_approved_check: bool,
    /// Upper bound on a single reconciliation
    pub reconcile_timeout: Duration,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            disable_approved_check: false,
            reconcile_timeout: Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
        }
    }
}

/// Shared state handed to every reconciliation
pub struct Context {
    pub store: Arc<dyn ObjectStore>,
    pub factory: Arc<dyn Factory>,
    pub collection: Arc<Collection>,
    pub clock: Arc<dyn Clock>,
    pub options: ReconcileOptions,
    /// Per-resource backoff, keyed by `<kind>/<namespace>/<name>`
    pub backoff_states: Mutex<HashMap<String, BackoffState>>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("collection", &self.collection)
            .field("clock", &self.clock)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Context {
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        factory: Arc<dyn Factory>,
        collection: Arc<Collection>,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            store,
            factory,
            collection,
            clock: Arc::new(SystemClock),
            options,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

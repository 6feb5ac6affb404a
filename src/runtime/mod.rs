//! # Runtime
//!
//! Wires the reconcilers into kube-runtime controllers.
//!
//! - `watch_loop.rs` - one controller per watched kind, run side by side
//! - `error_policy.rs` - per-resource Fibonacci backoff for failed reconciliations

pub mod error_policy;
pub mod watch_loop;

pub use watch_loop::run_controllers;

use crate::controller::{
    reconcile_certificate_request, reconcile_issuer, Context, ReconcilerError,
};
use crate::crd::{CertificateRequest, OriginClusterIssuer, OriginIssuer};
use crate::observability::metrics;
use crate::store::ObjectKey;
use futures::future::BoxFuture;
use kube::Resource;
use kube_runtime::controller::Action;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info_span, Instrument};

/// A resource kind with a reconciler
pub trait Reconciled:
    Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static
{
    /// Value of the `controller` metric label
    const CONTROLLER: &'static str;

    fn reconcile<'a>(
        ctx: &'a Context,
        key: &'a ObjectKey,
    ) -> BoxFuture<'a, Result<(), ReconcilerError>>;
}

impl Reconciled for OriginIssuer {
    const CONTROLLER: &'static str = "originissuer";

    fn reconcile<'a>(
        ctx: &'a Context,
        key: &'a ObjectKey,
    ) -> BoxFuture<'a, Result<(), ReconcilerError>> {
        Box::pin(reconcile_issuer::<Self>(ctx, key))
    }
}

impl Reconciled for OriginClusterIssuer {
    const CONTROLLER: &'static str = "originclusterissuer";

    fn reconcile<'a>(
        ctx: &'a Context,
        key: &'a ObjectKey,
    ) -> BoxFuture<'a, Result<(), ReconcilerError>> {
        Box::pin(reconcile_issuer::<Self>(ctx, key))
    }
}

impl Reconciled for CertificateRequest {
    const CONTROLLER: &'static str = "certificaterequest";

    fn reconcile<'a>(
        ctx: &'a Context,
        key: &'a ObjectKey,
    ) -> BoxFuture<'a, Result<(), ReconcilerError>> {
        Box::pin(reconcile_certificate_request(ctx, key))
    }
}

/// Key used for the per-resource backoff table
pub(crate) fn backoff_key<K: Reconciled>(key: &ObjectKey) -> String {
    format!("{}/{key}", K::CONTROLLER)
}

/// Run one reconciliation under the configured timeout, recording metrics
///
/// # Errors
/// Returns the reconciler's error, or [`ReconcilerError::Timeout`]
pub async fn reconcile<K: Reconciled>(
    obj: Arc<K>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcilerError> {
    let key = ObjectKey::of(obj.as_ref());
    let span = info_span!(
        "controller.reconcile",
        controller = K::CONTROLLER,
        resource = %key,
        resource_version = obj.meta().resource_version.as_deref().unwrap_or_default()
    );

    metrics::increment_reconciliations(K::CONTROLLER);
    let timeout = ctx.options.reconcile_timeout;
    let start = Instant::now();

    let result = match tokio::time::timeout(timeout, K::reconcile(&ctx, &key))
        .instrument(span)
        .await
    {
        Ok(result) => result,
        Err(_) => Err(ReconcilerError::Timeout(timeout)),
    };

    metrics::observe_reconciliation_duration(K::CONTROLLER, start.elapsed().as_secs_f64());

    if result.is_ok() {
        error_policy::reset_backoff::<K>(&ctx, &key);
    }

    result.map(|()| Action::await_change())
}

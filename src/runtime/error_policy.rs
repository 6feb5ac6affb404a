//! # Error Policy
//!
//! Failed reconciliations are requeued with a Fibonacci backoff tracked per
//! resource, so one failing issuer does not slow down retries of another.

use super::{backoff_key, Reconciled};
use crate::constants::{BACKOFF_MAX_MINUTES, BACKOFF_MIN_MINUTES, BACKOFF_STATE_TTL_MINUTES};
use crate::controller::backoff::BackoffState;
use crate::controller::{Context, ReconcilerError};
use crate::observability::metrics;
use crate::store::ObjectKey;
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Requeue a failed reconciliation after the resource's next backoff delay
pub fn handle_reconciliation_error<K: Reconciled>(
    obj: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<Context>,
) -> Action {
    let key = ObjectKey::of(obj.as_ref());
    error!(
        controller = K::CONTROLLER,
        resource = %key,
        error = %error,
        "reconciliation failed"
    );
    metrics::increment_reconciliation_errors(K::CONTROLLER);

    let (backoff_seconds, error_count) = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            prune_stale(
                &mut states,
                Duration::from_secs(BACKOFF_STATE_TTL_MINUTES * 60),
            );
            let state = states
                .entry(backoff_key::<K>(&key))
                .or_insert_with(|| BackoffState::new(BACKOFF_MIN_MINUTES, BACKOFF_MAX_MINUTES));
            state.increment_error();
            (state.backoff.next_backoff_seconds(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using default backoff", e);
            (BACKOFF_MIN_MINUTES * 60, 0)
        }
    };

    info!(
        controller = K::CONTROLLER,
        resource = %key,
        backoff_seconds,
        error_count,
        "retrying with Fibonacci backoff"
    );

    Action::requeue(Duration::from_secs(backoff_seconds))
}

/// Drop entries of resources that stopped failing without a successful
/// reconciliation, e.g. because they were deleted
fn prune_stale(states: &mut HashMap<String, BackoffState>, ttl: Duration) {
    let before = states.len();
    states.retain(|_, state| !state.is_stale(ttl));
    let pruned = before - states.len();
    if pruned > 0 {
        debug!(pruned, "dropped stale backoff state");
    }
}

/// Forget the backoff of a resource after a successful reconciliation
pub fn reset_backoff<K: Reconciled>(ctx: &Context, key: &ObjectKey) {
    if let Ok(mut states) = ctx.backoff_states.lock() {
        states.remove(&backoff_key::<K>(key));
    }
}

//! # Watch Loop
//!
//! Runs one kube-runtime controller per watched kind until a shutdown signal
//! is received. `/readyz` reports ready while the controllers run.

use super::error_policy::handle_reconciliation_error;
use super::{reconcile, Reconciled};
use crate::controller::Context;
use crate::crd::{CertificateRequest, OriginClusterIssuer, OriginIssuer};
use crate::server::ServerState;
use futures::StreamExt;
use kube::api::Api;
use kube::Client;
use kube_runtime::{controller, watcher, Controller};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

async fn run_controller<K: Reconciled>(api: Api<K>, ctx: Arc<Context>, concurrency: u16) {
    info!(controller = K::CONTROLLER, "starting controller");

    Controller::new(api, watcher::Config::default().any_semantic())
        .with_config(controller::Config::default().concurrency(concurrency))
        .shutdown_on_signal()
        .run(reconcile::<K>, handle_reconciliation_error::<K>, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => debug!(controller = K::CONTROLLER, resource = %object, "reconciled"),
                Err(controller::Error::ReconcilerFailed(_, _)) => {
                    // Already logged and requeued by the error policy
                }
                Err(e) => warn!(controller = K::CONTROLLER, error = %e, "controller stream error"),
            }
        })
        .await;

    info!(controller = K::CONTROLLER, "controller stopped");
}

/// Run the `OriginIssuer`, `OriginClusterIssuer` and `CertificateRequest`
/// controllers until shutdown
pub async fn run_controllers(
    client: Client,
    ctx: Arc<Context>,
    server_state: Arc<ServerState>,
    concurrency: u16,
) {
    let issuers = run_controller(
        Api::<OriginIssuer>::all(client.clone()),
        Arc::clone(&ctx),
        concurrency,
    );
    let cluster_issuers = run_controller(
        Api::<OriginClusterIssuer>::all(client.clone()),
        Arc::clone(&ctx),
        concurrency,
    );
    let requests = run_controller(
        Api::<CertificateRequest>::all(client),
        Arc::clone(&ctx),
        concurrency,
    );

    server_state.is_ready.store(true, Ordering::Relaxed);
    info!("controllers started");

    futures::join!(issuers, cluster_issuers, requests);

    server_state.is_ready.store(false, Ordering::Relaxed);
    info!("Controller stopped gracefully");
}

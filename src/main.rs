//! # Origin CA Issuer
//!
//! Controller binary. Watches `OriginIssuer`, `OriginClusterIssuer` and
//! cert-manager `CertificateRequest` resources and signs approved requests with
//! the Cloudflare Origin CA.

use anyhow::{Context as _, Result};
use clap::Parser;
use kube::Client;
use origin_ca_issuer::cfapi::{self, ClientFactory};
use origin_ca_issuer::config::{ControllerOptions, LogFormat};
use origin_ca_issuer::controller::Context;
use origin_ca_issuer::observability;
use origin_ca_issuer::provisioners::Collection;
use origin_ca_issuer::runtime::run_controllers;
use origin_ca_issuer::server::{start_server, ServerState};
use origin_ca_issuer::store::KubeStore;
use std::sync::Arc;
use tracing::{error, info};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "origin_ca_issuer=info,kube=warn".into());

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before any TLS connection is made
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_provider| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let options = ControllerOptions::parse();
    options.validate()?;

    init_tracing(options.log_format);

    info!("Starting Origin CA issuer");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_port = options.metrics_port;
    let server_state_clone = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {:#}", e);
        }
    });

    let endpoint = options
        .api_endpoint
        .as_deref()
        .map(cfapi::endpoint_from)
        .transpose()
        .context("invalid --api-endpoint")?;
    let http = reqwest::Client::builder()
        .timeout(options.ca_request_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let ctx = Arc::new(Context::new(
        Arc::new(KubeStore::new(client.clone())),
        Arc::new(ClientFactory::new(http, endpoint)),
        Arc::new(Collection::new()),
        options.reconcile_options(),
    ));

    info!(
        disable_approved_check = options.disable_approved_check,
        max_concurrent_reconciles = options.max_concurrent_reconciles,
        "starting controllers"
    );
    run_controllers(client, ctx, server_state, options.max_concurrent_reconciles).await;

    Ok(())
}

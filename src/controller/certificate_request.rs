//! # CertificateRequest Reconciler
//!
//! Signs `CertificateRequest`s that reference an Origin issuer. A request
//! passes through a fixed sequence of checks; the first one that matches
//! decides the outcome:
//!
//! 1. Issuer group belongs to someone else: ignore
//! 2. Already `Ready=True`: ignore
//! 3. `Ready=False` with reason `Failed` or `Denied`: ignore, both are terminal
//! 4. `Denied=True`: mark `Ready=False/Denied` and stamp `failureTime`
//! 5. Approval required but not granted: ignore until approved
//! 6. Certificate already present, or a CA certificate requested: ignore
//! 7. Referenced issuer missing or not ready: `Pending`, retried
//! 8. No provisioner loaded for the issuer yet: `Pending`, retried
//! 9. Sign: `Issued` with the certificate, or `Failed`
//!
//! Only the final status write of a successful path is treated as the result
//! of the reconciliation; writes on failure paths are best effort.

use super::conditions::{has_condition, set_condition};
use super::duration::parse_duration;
use super::{Context, IssuerResource, ReconcilerError};
use crate::constants::API_GROUP;
use crate::crd::{
    CertificateRequest, ConditionStatus, IssuerKind, OriginClusterIssuer, OriginIssuer,
    CONDITION_APPROVED, CONDITION_DENIED, CONDITION_READY, REASON_DENIED, REASON_FAILED,
    REASON_ISSUED, REASON_PENDING,
};
use crate::observability::metrics;
use crate::provisioners::Provisioner;
use crate::store::{ObjectKey, ObjectStore, StoreError};
use chrono::SecondsFormat;
use k8s_openapi::ByteString;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const DENIED_MESSAGE: &str = "The CertificateRequest was denied by an approval controller";

/// Set the `Ready` condition of a request in memory
fn set_ready(
    ctx: &Context,
    request: &mut CertificateRequest,
    status: ConditionStatus,
    reason: &str,
    message: &str,
) {
    let now = ctx.clock.now();
    let generation = request.metadata.generation;
    set_condition(
        &mut request.status_mut().conditions,
        CONDITION_READY,
        status,
        reason,
        message,
        now,
        generation,
    );
}

/// Record the first terminal failure; later failures keep the original time
fn stamp_failure_time(ctx: &Context, request: &mut CertificateRequest) {
    let now = ctx.clock.now();
    let status = request.status_mut();
    if status.failure_time.is_none() {
        status.failure_time = Some(now.to_rfc3339_opts(SecondsFormat::Secs, true));
    }
}

async fn write_best_effort(ctx: &Context, request: &CertificateRequest, key: &ObjectKey) {
    if let Err(e) = ctx.store.update_certificate_request_status(request).await {
        warn!(%key, error = %e, "failed to update certificate request status");
    }
}

async fn mark_pending(ctx: &Context, request: &mut CertificateRequest, key: &ObjectKey, message: &str) {
    set_ready(ctx, request, ConditionStatus::False, REASON_PENDING, message);
    write_best_effort(ctx, request, key).await;
}

async fn mark_failed(ctx: &Context, request: &mut CertificateRequest, key: &ObjectKey, message: &str) {
    set_ready(ctx, request, ConditionStatus::False, REASON_FAILED, message);
    stamp_failure_time(ctx, request);
    write_best_effort(ctx, request, key).await;
}

/// Reason the request is skipped without any status change, if any
fn ignore_reason(request: &CertificateRequest) -> Option<&'static str> {
    let group = &request.spec.issuer_ref.group;
    if !group.is_empty() && group != API_GROUP {
        return Some("issuerRef group is not handled by this issuer");
    }

    if let Some(ready) = request.ready_condition() {
        match ready.status {
            ConditionStatus::True => return Some("request is already ready"),
            ConditionStatus::False if ready.reason_is(REASON_FAILED) => {
                return Some("request has already failed")
            }
            ConditionStatus::False if ready.reason_is(REASON_DENIED) => {
                return Some("request has already been denied")
            }
            _ => {}
        }
    }

    None
}

/// Fetch the referenced issuer and check it is ready
async fn ready_issuer<I: IssuerResource>(
    store: &dyn ObjectStore,
    key: &ObjectKey,
) -> Result<bool, StoreError> {
    I::fetch(store, key).await.map(|issuer| issuer.is_ready())
}

/// Reconcile a single certificate request
///
/// # Errors
/// Returns an error when the request could not be signed yet and should be retried
pub async fn reconcile_certificate_request(
    ctx: &Context,
    key: &ObjectKey,
) -> Result<(), ReconcilerError> {
    let mut request = match ctx.store.get_certificate_request(key).await {
        Ok(request) => request,
        Err(e) if e.is_not_found() => {
            debug!(%key, "certificate request no longer exists");
            return Ok(());
        }
        Err(e) => {
            error!(%key, error = %e, "failed to retrieve certificate request");
            return Err(e.into());
        }
    };

    if let Some(reason) = ignore_reason(&request) {
        debug!(%key, reason, "skipping certificate request");
        return Ok(());
    }

    if request.has_condition(CONDITION_DENIED, ConditionStatus::True) {
        info!(%key, "certificate request denied, marking as failed");
        set_ready(ctx, &mut request, ConditionStatus::False, REASON_DENIED, DENIED_MESSAGE);
        stamp_failure_time(ctx, &mut request);
        ctx.store.update_certificate_request_status(&request).await?;
        return Ok(());
    }

    if !ctx.options.disable_approved_check
        && !has_condition(request.conditions(), CONDITION_APPROVED, ConditionStatus::True)
    {
        debug!(%key, "certificate request has not been approved yet");
        return Ok(());
    }

    if request.has_certificate() {
        debug!(%key, "existing certificate data found in status, skipping already completed request");
        return Ok(());
    }

    if request.spec.is_ca {
        info!(%key, "signing of CA certificates is not supported");
        return Ok(());
    }

    let kind = IssuerKind::from_reference_kind(&request.spec.issuer_ref.kind);
    let issuer_key = match kind {
        IssuerKind::OriginClusterIssuer => ObjectKey::cluster(request.spec.issuer_ref.name.clone()),
        IssuerKind::OriginIssuer => ObjectKey::namespaced(
            key.namespace.clone().unwrap_or_default(),
            request.spec.issuer_ref.name.clone(),
        ),
    };

    let ready = match kind {
        IssuerKind::OriginIssuer => ready_issuer::<OriginIssuer>(ctx.store.as_ref(), &issuer_key).await,
        IssuerKind::OriginClusterIssuer => {
            ready_issuer::<OriginClusterIssuer>(ctx.store.as_ref(), &issuer_key).await
        }
    };
    match ready {
        Ok(true) => {}
        Ok(false) => {
            let e = ReconcilerError::IssuerNotReady {
                kind,
                key: issuer_key.clone(),
            };
            error!(%key, issuer = %issuer_key, error = %e, "issuer failed readiness checks");
            let message = format!("{kind} {issuer_key} is not Ready");
            mark_pending(ctx, &mut request, key, &message).await;
            return Err(e);
        }
        Err(source) => {
            error!(%key, issuer = %issuer_key, error = %source, "failed to retrieve issuer");
            let message = format!("Failed to retrieve {kind} resource {issuer_key}: {source}");
            mark_pending(ctx, &mut request, key, &message).await;
            return Err(ReconcilerError::IssuerNotFound {
                kind,
                key: issuer_key,
                source,
            });
        }
    }

    let Some(provisioner) = ctx.collection.load(&issuer_key) else {
        let e = ReconcilerError::ProvisionerNotFound {
            kind,
            key: issuer_key.clone(),
        };
        error!(%key, error = %e, "failed to load provisioner");
        let message = format!("Failed to load provisioner for {kind} resource {issuer_key}");
        mark_pending(ctx, &mut request, key, &message).await;
        return Err(e);
    };

    let certificate = match sign(&provisioner, &request).await {
        Ok(certificate) => certificate,
        Err(e) => {
            error!(%key, error = %e, "failed to sign certificate request");
            let message = format!("Failed to sign certificate request: {e}");
            mark_failed(ctx, &mut request, key, &message).await;
            return Err(e);
        }
    };

    request.status_mut().certificate = Some(ByteString(certificate));
    set_ready(ctx, &mut request, ConditionStatus::True, REASON_ISSUED, "Certificate issued");
    ctx.store.update_certificate_request_status(&request).await?;

    metrics::increment_certificates_signed(provisioner.request_type().as_str());
    info!(%key, issuer = %issuer_key, "certificate issued");
    Ok(())
}

async fn sign(
    provisioner: &Arc<Provisioner>,
    request: &CertificateRequest,
) -> Result<Vec<u8>, ReconcilerError> {
    let duration = request
        .spec
        .duration
        .as_deref()
        .map(parse_duration)
        .transpose()?;

    Ok(provisioner.sign(&request.spec.request.0, duration).await?)
}

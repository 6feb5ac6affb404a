//! # Issuer Readiness
//!
//! One reconciliation body serves both `OriginIssuer` and `OriginClusterIssuer`:
//!
//! 1. Validate the spec (no status is written when this fails)
//! 2. Resolve and fetch the service key secret
//! 3. Build an Origin CA client and a provisioner for it
//! 4. Store the provisioner in the collection under the issuer's key
//! 5. Mark the issuer `Ready`
//!
//! Failures in steps 2 and 3 are reported through the `Ready` condition and
//! then returned so the issuer is retried.

use super::conditions::set_condition;
use super::{Context, ReconcilerError};
use crate::crd::{
    ConditionStatus, IssuerKind, OriginClusterIssuer, OriginIssuer, OriginIssuerAuthentication,
    OriginIssuerStatus, RequestType, CONDITION_READY, REASON_ERROR, REASON_NOT_FOUND,
    REASON_VERIFIED,
};
use crate::observability::metrics;
use crate::provisioners::Provisioner;
use crate::store::{ObjectKey, ObjectStore, StoreError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

/// Access to the parts of an issuer resource the readiness state machine needs
#[async_trait]
pub trait IssuerResource:
    kube::Resource<DynamicType = ()> + Clone + std::fmt::Debug + Send + Sync + 'static
{
    const KIND: IssuerKind;

    fn request_type(&self) -> &str;

    fn auth(&self) -> &OriginIssuerAuthentication;

    fn issuer_status(&self) -> Option<&OriginIssuerStatus>;

    fn issuer_status_mut(&mut self) -> &mut OriginIssuerStatus;

    /// Location of the service key secret, given the issuer's own key
    ///
    /// # Errors
    /// Returns an error if the issuer does not define where its secret lives
    fn secret_key(&self, issuer_key: &ObjectKey) -> Result<ObjectKey, ReconcilerError>;

    async fn fetch(store: &dyn ObjectStore, key: &ObjectKey) -> Result<Self, StoreError>;

    async fn write_status(&self, store: &dyn ObjectStore) -> Result<(), StoreError>;

    /// True when the issuer reports `Ready=True`
    fn is_ready(&self) -> bool {
        self.issuer_status().is_some_and(|status| {
            status
                .conditions
                .iter()
                .any(|c| c.is(CONDITION_READY, ConditionStatus::True))
        })
    }
}

#[async_trait]
impl IssuerResource for OriginIssuer {
    const KIND: IssuerKind = IssuerKind::OriginIssuer;

    fn request_type(&self) -> &str {
        &self.spec.request_type
    }

    fn auth(&self) -> &OriginIssuerAuthentication {
        &self.spec.auth
    }

    fn issuer_status(&self) -> Option<&OriginIssuerStatus> {
        self.status.as_ref()
    }

    fn issuer_status_mut(&mut self) -> &mut OriginIssuerStatus {
        self.status.get_or_insert_with(OriginIssuerStatus::default)
    }

    fn secret_key(&self, issuer_key: &ObjectKey) -> Result<ObjectKey, ReconcilerError> {
        // The secret always lives next to a namespaced issuer
        let namespace = issuer_key
            .namespace
            .clone()
            .or_else(|| self.metadata.namespace.clone())
            .unwrap_or_default();
        Ok(ObjectKey::namespaced(
            namespace,
            self.spec.auth.service_key_ref.name.clone(),
        ))
    }

    async fn fetch(store: &dyn ObjectStore, key: &ObjectKey) -> Result<Self, StoreError> {
        store.get_origin_issuer(key).await
    }

    async fn write_status(&self, store: &dyn ObjectStore) -> Result<(), StoreError> {
        store.update_origin_issuer_status(self).await
    }
}

#[async_trait]
impl IssuerResource for OriginClusterIssuer {
    const KIND: IssuerKind = IssuerKind::OriginClusterIssuer;

    fn request_type(&self) -> &str {
        &self.spec.request_type
    }

    fn auth(&self) -> &OriginIssuerAuthentication {
        &self.spec.auth
    }

    fn issuer_status(&self) -> Option<&OriginIssuerStatus> {
        self.status.as_ref()
    }

    fn issuer_status_mut(&mut self) -> &mut OriginIssuerStatus {
        self.status.get_or_insert_with(OriginIssuerStatus::default)
    }

    fn secret_key(&self, _issuer_key: &ObjectKey) -> Result<ObjectKey, ReconcilerError> {
        let selector = &self.spec.auth.service_key_ref;
        if selector.namespace.is_empty() {
            return Err(ReconcilerError::Validation(
                "no namespace defined for secret".to_string(),
            ));
        }
        Ok(ObjectKey::namespaced(
            selector.namespace.clone(),
            selector.name.clone(),
        ))
    }

    async fn fetch(store: &dyn ObjectStore, key: &ObjectKey) -> Result<Self, StoreError> {
        store.get_origin_cluster_issuer(key).await
    }

    async fn write_status(&self, store: &dyn ObjectStore) -> Result<(), StoreError> {
        store.update_origin_cluster_issuer_status(self).await
    }
}

/// Check required fields and enums of an issuer spec
///
/// # Errors
/// Returns the first violation found
pub fn validate(request_type: &str, auth: &OriginIssuerAuthentication) -> Result<RequestType, ReconcilerError> {
    let selector = &auth.service_key_ref;
    if selector.name.is_empty() {
        return Err(ReconcilerError::Validation(
            "spec.auth.serviceKeyRef.name cannot be empty".to_string(),
        ));
    }
    if selector.key.is_empty() {
        return Err(ReconcilerError::Validation(
            "spec.auth.serviceKeyRef.key cannot be empty".to_string(),
        ));
    }
    if request_type.is_empty() {
        return Err(ReconcilerError::Validation(
            "spec.requestType cannot be empty".to_string(),
        ));
    }
    RequestType::parse(request_type).ok_or_else(|| {
        ReconcilerError::Validation(format!(
            "spec.requestType has invalid value {request_type:?}"
        ))
    })
}

/// Set the `Ready` condition and write the issuer's status
async fn set_ready<I: IssuerResource>(
    ctx: &Context,
    issuer: &mut I,
    status: ConditionStatus,
    reason: &str,
    message: &str,
) -> Result<(), StoreError> {
    let generation = issuer.meta().generation;
    set_condition(
        &mut issuer.issuer_status_mut().conditions,
        CONDITION_READY,
        status,
        reason,
        message,
        ctx.clock.now(),
        generation,
    );
    issuer.write_status(ctx.store.as_ref()).await
}

/// Best effort variant of [`set_ready`] for failure paths
async fn report_failure<I: IssuerResource>(
    ctx: &Context,
    issuer: &mut I,
    reason: &str,
    message: &str,
) {
    if let Err(e) = set_ready(ctx, issuer, ConditionStatus::False, reason, message).await {
        warn!(kind = %I::KIND, error = %e, "failed to update issuer status");
    }
}

fn service_key(secret: &Secret, key: &str) -> Option<Zeroizing<Vec<u8>>> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| Zeroizing::new(value.0.clone()))
}

/// Reconcile an issuer into a ready provisioner
///
/// # Errors
/// Returns an error whenever the issuer could not be made ready
pub async fn reconcile_issuer<I: IssuerResource>(
    ctx: &Context,
    key: &ObjectKey,
) -> Result<(), ReconcilerError> {
    let kind = I::KIND;

    let mut issuer = match I::fetch(ctx.store.as_ref(), key).await {
        Ok(issuer) => issuer,
        Err(e) if e.is_not_found() => {
            debug!(%kind, %key, "issuer no longer exists");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let request_type = validate(issuer.request_type(), issuer.auth()).inspect_err(|e| {
        error!(%kind, %key, error = %e, "failed to validate issuer");
    })?;
    let secret_key = issuer.secret_key(key).inspect_err(|e| {
        error!(%kind, %key, error = %e, "unable to locate auth secret");
    })?;

    let secret = match ctx.store.get_secret(&secret_key).await {
        Ok(secret) => secret,
        Err(e) => {
            error!(%kind, %key, secret = %secret_key, error = %e, "failed to retrieve auth secret");
            let reason = if e.is_not_found() {
                REASON_NOT_FOUND
            } else {
                REASON_ERROR
            };
            let message = format!("Failed to retrieve auth secret: {e}");
            report_failure(ctx, &mut issuer, reason, &message).await;

            return Err(if e.is_not_found() {
                ReconcilerError::SecretNotFound(e)
            } else {
                ReconcilerError::Store(e)
            });
        }
    };

    let selector_key = issuer.auth().service_key_ref.key.clone();
    let Some(service_key) = service_key(&secret, &selector_key) else {
        let e = ReconcilerError::SecretKeyMissing {
            secret: secret_key.name.clone(),
            key: selector_key,
        };
        error!(%kind, %key, error = %e, "failed to retrieve auth secret");
        let message = format!("Failed to retrieve auth secret: {e}");
        report_failure(ctx, &mut issuer, REASON_NOT_FOUND, &message).await;
        return Err(e);
    };

    let signer = match ctx.factory.api_with(&service_key) {
        Ok(signer) => signer,
        Err(e) => {
            error!(%kind, %key, error = %e, "failed to create Origin CA client");
            let message = format!("Failed to initialize provisioner: {e}");
            report_failure(ctx, &mut issuer, REASON_ERROR, &message).await;
            return Err(ReconcilerError::ClientInit(e));
        }
    };

    // Provisioners outlive their issuer; nothing removes them on deletion.
    ctx.collection.store(
        key.clone(),
        Arc::new(Provisioner::new(signer, request_type)),
    );
    metrics::set_provisioners(ctx.collection.len());

    let message = format!("{kind} verified and ready to sign certificates");
    set_ready(ctx, &mut issuer, ConditionStatus::True, REASON_VERIFIED, &message).await?;

    info!(%kind, %key, request_type = %request_type, "issuer ready");
    Ok(())
}

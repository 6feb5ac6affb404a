use crate::cfapi;
use crate::crd::IssuerKind;
use crate::provisioners::ProvisionerError;
use crate::store::{ObjectKey, StoreError};
use std::time::Duration;
use thiserror::Error;

/// Errors returned from a reconciliation; every variant is retried with backoff
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("{0}")]
    Validation(String),
    #[error("failed to retrieve auth secret: {0}")]
    SecretNotFound(#[source] StoreError),
    #[error("secret {secret} does not contain key {key:?}")]
    SecretKeyMissing { secret: String, key: String },
    #[error("failed to create Origin CA client: {0}")]
    ClientInit(#[from] cfapi::Error),
    #[error("failed to retrieve {kind} resource {key}: {source}")]
    IssuerNotFound {
        kind: IssuerKind,
        key: ObjectKey,
        #[source]
        source: StoreError,
    },
    #[error("{kind} {key} is not ready")]
    IssuerNotReady { kind: IssuerKind, key: ObjectKey },
    #[error("provisioner for {kind} {key} not found")]
    ProvisionerNotFound { kind: IssuerKind, key: ObjectKey },
    #[error(transparent)]
    InvalidDuration(#[from] super::duration::DurationError),
    #[error(transparent)]
    Sign(#[from] ProvisionerError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("reconciliation timed out after {0:?}")]
    Timeout(Duration),
}

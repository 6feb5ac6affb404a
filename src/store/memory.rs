//! [`ObjectStore`] holding resources in memory.
//!
//! Status writes only replace the stored object's `status`, the way the
//! status subresource does on a real API server, and are counted so callers
//! can assert that a reconcile left a resource untouched.

use super::{ObjectKey, ObjectStore, StoreError};
use crate::crd::{CertificateRequest, OriginClusterIssuer, OriginIssuer};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    issuers: Mutex<HashMap<ObjectKey, OriginIssuer>>,
    cluster_issuers: Mutex<HashMap<ObjectKey, OriginClusterIssuer>>,
    requests: Mutex<HashMap<ObjectKey, CertificateRequest>>,
    secrets: Mutex<HashMap<ObjectKey, Secret>>,
    secret_error: Mutex<Option<String>>,
    status_error: Mutex<Option<String>>,
    status_writes: AtomicUsize,
}

fn get<T: Clone>(
    map: &Mutex<HashMap<ObjectKey, T>>,
    kind: &'static str,
    key: &ObjectKey,
) -> Result<T, StoreError> {
    map.lock()
        .map_err(|e| StoreError::Backend(format!("{kind} store poisoned: {e}")))?
        .get(key)
        .cloned()
        .ok_or_else(|| StoreError::NotFound {
            kind,
            key: key.to_string(),
        })
}

fn insert<T>(map: &Mutex<HashMap<ObjectKey, T>>, key: ObjectKey, object: T) {
    if let Ok(mut map) = map.lock() {
        map.insert(key, object);
    }
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_origin_issuer(&self, issuer: OriginIssuer) {
        insert(&self.issuers, ObjectKey::of(&issuer), issuer);
    }

    pub fn insert_origin_cluster_issuer(&self, issuer: OriginClusterIssuer) {
        insert(&self.cluster_issuers, ObjectKey::of(&issuer), issuer);
    }

    pub fn insert_certificate_request(&self, request: CertificateRequest) {
        insert(&self.requests, ObjectKey::of(&request), request);
    }

    pub fn insert_secret(&self, secret: Secret) {
        insert(&self.secrets, ObjectKey::of(&secret), secret);
    }

    /// Make every secret read fail with a backend error
    pub fn fail_secret_reads(&self, message: impl Into<String>) {
        if let Ok(mut error) = self.secret_error.lock() {
            *error = Some(message.into());
        }
    }

    /// Make every status write fail with a backend error
    pub fn fail_status_writes(&self, message: impl Into<String>) {
        if let Ok(mut error) = self.status_error.lock() {
            *error = Some(message.into());
        }
    }

    /// Number of successful status writes so far
    #[must_use]
    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    fn injected(slot: &Mutex<Option<String>>) -> Result<(), StoreError> {
        match slot.lock().ok().and_then(|error| error.clone()) {
            Some(message) => Err(StoreError::Backend(message)),
            None => Ok(()),
        }
    }

    fn write_status<T, F>(
        &self,
        map: &Mutex<HashMap<ObjectKey, T>>,
        kind: &'static str,
        key: ObjectKey,
        apply: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(&mut T),
    {
        Self::injected(&self.status_error)?;

        let mut map = map
            .lock()
            .map_err(|e| StoreError::Backend(format!("{kind} store poisoned: {e}")))?;
        let stored = map.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            kind,
            key: key.to_string(),
        })?;
        apply(stored);
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get_origin_issuer(&self, key: &ObjectKey) -> Result<OriginIssuer, StoreError> {
        get(&self.issuers, "OriginIssuer", key)
    }

    async fn update_origin_issuer_status(&self, issuer: &OriginIssuer) -> Result<(), StoreError> {
        self.write_status(&self.issuers, "OriginIssuer", ObjectKey::of(issuer), |stored| {
            stored.status.clone_from(&issuer.status);
        })
    }

    async fn get_origin_cluster_issuer(
        &self,
        key: &ObjectKey,
    ) -> Result<OriginClusterIssuer, StoreError> {
        get(&self.cluster_issuers, "OriginClusterIssuer", key)
    }

    async fn update_origin_cluster_issuer_status(
        &self,
        issuer: &OriginClusterIssuer,
    ) -> Result<(), StoreError> {
        self.write_status(
            &self.cluster_issuers,
            "OriginClusterIssuer",
            ObjectKey::of(issuer),
            |stored| stored.status.clone_from(&issuer.status),
        )
    }

    async fn get_certificate_request(
        &self,
        key: &ObjectKey,
    ) -> Result<CertificateRequest, StoreError> {
        get(&self.requests, "CertificateRequest", key)
    }

    async fn update_certificate_request_status(
        &self,
        request: &CertificateRequest,
    ) -> Result<(), StoreError> {
        self.write_status(
            &self.requests,
            "CertificateRequest",
            ObjectKey::of(request),
            |stored| stored.status.clone_from(&request.status),
        )
    }

    async fn get_secret(&self, key: &ObjectKey) -> Result<Secret, StoreError> {
        Self::injected(&self.secret_error)?;
        get(&self.secrets, "Secret", key)
    }
}

//! # Object Store
//!
//! The get/update contract the reconcilers use to read resources and write
//! their status back.
//!
//! - `kube.rs` - [`KubeStore`], backed by the Kubernetes API
//! - `memory.rs` - [`InMemoryStore`], used by tests and local runs

mod kube;
mod memory;

pub use self::kube::KubeStore;
pub use self::memory::InMemoryStore;

use crate::crd::{CertificateRequest, OriginClusterIssuer, OriginIssuer};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use std::fmt;
use thiserror::Error;

/// Identity of a resource: namespace and name, or name alone when cluster scoped
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Key of a fetched object; an empty namespace counts as cluster scoped
    #[must_use]
    pub fn of<K: ::kube::Resource>(object: &K) -> Self {
        let meta = object.meta();
        Self {
            namespace: meta.namespace.clone().filter(|ns| !ns.is_empty()),
            name: meta.name.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {key:?} not found")]
    NotFound { kind: &'static str, key: String },
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] ::kube::Error),
    #[error("failed to serialize status: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Any other backend failure, e.g. an unreachable store
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Reads resources and writes their status
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_origin_issuer(&self, key: &ObjectKey) -> Result<OriginIssuer, StoreError>;

    async fn update_origin_issuer_status(&self, issuer: &OriginIssuer) -> Result<(), StoreError>;

    async fn get_origin_cluster_issuer(
        &self,
        key: &ObjectKey,
    ) -> Result<OriginClusterIssuer, StoreError>;

    async fn update_origin_cluster_issuer_status(
        &self,
        issuer: &OriginClusterIssuer,
    ) -> Result<(), StoreError>;

    async fn get_certificate_request(
        &self,
        key: &ObjectKey,
    ) -> Result<CertificateRequest, StoreError>;

    /// Write `status` (conditions, certificate, failureTime) of the request
    async fn update_certificate_request_status(
        &self,
        request: &CertificateRequest,
    ) -> Result<(), StoreError>;

    async fn get_secret(&self, key: &ObjectKey) -> Result<Secret, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_display() {
        assert_eq!(ObjectKey::namespaced("default", "issuer").to_string(), "default/issuer");
        assert_eq!(ObjectKey::cluster("issuer").to_string(), "issuer");
    }

    #[test]
    fn test_object_key_of_cluster_resource() {
        let issuer = OriginClusterIssuer::new(
            "issuer",
            crate::crd::OriginClusterIssuerSpec {
                request_type: "OriginECC".to_string(),
                auth: crate::crd::OriginIssuerAuthentication::default(),
            },
        );
        assert_eq!(ObjectKey::of(&issuer), ObjectKey::cluster("issuer"));
    }

    #[test]
    fn test_object_key_of_namespaced_resource() {
        let mut issuer = OriginIssuer::new(
            "issuer",
            crate::crd::OriginIssuerSpec {
                request_type: "OriginECC".to_string(),
                auth: crate::crd::OriginIssuerAuthentication::default(),
            },
        );
        issuer.metadata.namespace = Some("default".to_string());
        assert_eq!(ObjectKey::of(&issuer), ObjectKey::namespaced("default", "issuer"));

        issuer.metadata.namespace = Some(String::new());
        assert_eq!(ObjectKey::of(&issuer), ObjectKey::cluster("issuer"));
    }
}

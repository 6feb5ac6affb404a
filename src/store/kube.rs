//! [`ObjectStore`] backed by the Kubernetes API.

use super::{ObjectKey, ObjectStore, StoreError};
use crate::constants::FIELD_MANAGER;
use crate::crd::{CertificateRequest, OriginClusterIssuer, OriginIssuer};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
    {
        match namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::default_namespaced(self.client.clone()),
        }
    }

    async fn get_from<K>(api: Api<K>, key: &ObjectKey) -> Result<K, StoreError>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
    {
        match api.get(&key.name).await {
            Ok(object) => Ok(object),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Err(StoreError::NotFound {
                kind: kind_of::<K>(),
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn patch_status_of<K, S>(api: Api<K>, object: &K, status: &S) -> Result<(), StoreError>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
        S: Serialize,
    {
        let name = object.meta().name.as_deref().unwrap_or_default();
        let patch = serde_json::json!({
            "status": serde_json::to_value(status)?
        });

        match api
            .patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(patch))
            .await
        {
            Ok(_) => {
                debug!(kind = kind_of::<K>(), name = %name, "status updated");
                Ok(())
            }
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Err(StoreError::NotFound {
                kind: kind_of::<K>(),
                key: ObjectKey::of(object).to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn kind_of<K: Resource<DynamicType = ()>>() -> &'static str {
    match K::kind(&()).as_ref() {
        "OriginIssuer" => "OriginIssuer",
        "OriginClusterIssuer" => "OriginClusterIssuer",
        "CertificateRequest" => "CertificateRequest",
        "Secret" => "Secret",
        _ => "resource",
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_origin_issuer(&self, key: &ObjectKey) -> Result<OriginIssuer, StoreError> {
        Self::get_from(self.api(key.namespace.as_deref()), key).await
    }

    async fn update_origin_issuer_status(&self, issuer: &OriginIssuer) -> Result<(), StoreError> {
        let api = self.api(issuer.metadata.namespace.as_deref());
        Self::patch_status_of(api, issuer, &issuer.status).await
    }

    async fn get_origin_cluster_issuer(
        &self,
        key: &ObjectKey,
    ) -> Result<OriginClusterIssuer, StoreError> {
        Self::get_from(Api::all(self.client.clone()), key).await
    }

    async fn update_origin_cluster_issuer_status(
        &self,
        issuer: &OriginClusterIssuer,
    ) -> Result<(), StoreError> {
        Self::patch_status_of(Api::all(self.client.clone()), issuer, &issuer.status).await
    }

    async fn get_certificate_request(
        &self,
        key: &ObjectKey,
    ) -> Result<CertificateRequest, StoreError> {
        Self::get_from(self.api(key.namespace.as_deref()), key).await
    }

    async fn update_certificate_request_status(
        &self,
        request: &CertificateRequest,
    ) -> Result<(), StoreError> {
        let api = self.api(request.metadata.namespace.as_deref());
        Self::patch_status_of(api, request, &request.status).await
    }

    async fn get_secret(&self, key: &ObjectKey) -> Result<Secret, StoreError> {
        Self::get_from(self.api(key.namespace.as_deref()), key).await
    }
}

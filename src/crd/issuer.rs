//! # Origin Issuers
//!
//! `OriginIssuer` (namespaced) and `OriginClusterIssuer` (cluster scoped) describe
//! how to authenticate to the Origin CA and which signature algorithm to request.

use super::condition::Condition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issuer condition reasons
pub const REASON_VERIFIED: &str = "Verified";
pub const REASON_NOT_FOUND: &str = "NotFound";
pub const REASON_ERROR: &str = "Error";

/// An `OriginIssuer` represents the Origin CA as an external cert-manager issuer.
///
/// It is scoped to a single namespace, so it can be used only by
/// `CertificateRequest` resources in the same namespace. The service key
/// secret is read from that namespace too.
///
/// # Example
///
/// ```yaml
/// apiVersion: cert-manager.k8s.cloudflare.com/v1
/// kind: OriginIssuer
/// metadata:
///   name: prod-issuer
///   namespace: default
/// spec:
///   requestType: OriginECC
///   auth:
///     serviceKeyRef:
///       name: service-key
///       key: key
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "OriginIssuer",
    group = "cert-manager.k8s.cloudflare.com",
    version = "v1",
    namespaced,
    status = "OriginIssuerStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OriginIssuerSpec {
    /// Signature algorithm the Origin CA should use (`OriginRSA` or `OriginECC`)
    #[serde(default)]
    pub request_type: String,
    /// How to authenticate with the Origin CA API
    #[serde(default)]
    pub auth: OriginIssuerAuthentication,
}

/// An `OriginClusterIssuer` is the cluster wide variant of `OriginIssuer`.
///
/// Because it has no namespace of its own, `auth.serviceKeyRef.namespace`
/// must name the namespace holding the service key secret.
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "OriginClusterIssuer",
    group = "cert-manager.k8s.cloudflare.com",
    version = "v1",
    status = "OriginIssuerStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OriginClusterIssuerSpec {
    /// Signature algorithm the Origin CA should use (`OriginRSA` or `OriginECC`)
    #[serde(default)]
    pub request_type: String,
    /// How to authenticate with the Origin CA API
    #[serde(default)]
    pub auth: OriginIssuerAuthentication,
}

/// Authentication settings for the Origin CA API
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OriginIssuerAuthentication {
    /// Authenticate with an Origin CA service key stored in a secret
    #[serde(default)]
    pub service_key_ref: SecretKeySelector,
}

/// Reference to a single key of a secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Name of the secret
    #[serde(default)]
    pub name: String,
    /// Namespace of the secret; required for cluster issuers, ignored otherwise
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Key within the secret's data holding the service key
    #[serde(default)]
    pub key: String,
}

/// Status of an issuer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OriginIssuerStatus {
    /// Known condition types are `Ready`
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Signature algorithm requested from the Origin CA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// RSA-2048 key, SHA-256 signature
    OriginRsa,
    /// ECDSA P-256 key, SHA-256 signature
    OriginEcc,
}

impl RequestType {
    /// Parse the value stored in `spec.requestType`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OriginRSA" => Some(RequestType::OriginRsa),
            "OriginECC" => Some(RequestType::OriginEcc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::OriginRsa => "OriginRSA",
            RequestType::OriginEcc => "OriginECC",
        }
    }

    /// Token sent as `request_type` on the wire
    #[must_use]
    pub fn wire_token(self) -> &'static str {
        match self {
            RequestType::OriginRsa => "origin-rsa",
            RequestType::OriginEcc => "origin-ecc",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which issuer resource a reference or reconciliation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssuerKind {
    OriginIssuer,
    OriginClusterIssuer,
}

impl IssuerKind {
    /// Select the issuer kind named by a `CertificateRequest` issuer reference.
    ///
    /// Only `OriginClusterIssuer` selects the cluster scoped lookup; every
    /// other kind, including an empty one, resolves to `OriginIssuer`.
    #[must_use]
    pub fn from_reference_kind(kind: &str) -> Self {
        if kind == "OriginClusterIssuer" {
            IssuerKind::OriginClusterIssuer
        } else {
            IssuerKind::OriginIssuer
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IssuerKind::OriginIssuer => "OriginIssuer",
            IssuerKind::OriginClusterIssuer => "OriginClusterIssuer",
        }
    }
}

impl fmt::Display for IssuerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! # CertificateRequest
//!
//! The subset of cert-manager's `CertificateRequest` (`cert-manager.io/v1`) that the
//! issuer reads and writes. The CRD itself is installed by cert-manager, so no
//! schema is generated for it here.

use super::condition::{Condition, ConditionStatus, CONDITION_READY};
use k8s_openapi::ByteString;
use serde::{Deserialize, Serialize};

/// Condition type set by an approval controller once a request may be signed
pub const CONDITION_APPROVED: &str = "Approved";
/// Condition type set by an approval controller when a request must not be signed
pub const CONDITION_DENIED: &str = "Denied";

/// CertificateRequest `Ready` reasons
pub const REASON_PENDING: &str = "Pending";
pub const REASON_ISSUED: &str = "Issued";
pub const REASON_FAILED: &str = "Failed";
pub const REASON_DENIED: &str = "Denied";

#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize)]
#[kube(
    kind = "CertificateRequest",
    group = "cert-manager.io",
    version = "v1",
    namespaced,
    status = "CertificateRequestStatus",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestSpec {
    /// Requested certificate lifetime as a Go duration string (e.g. `2160h0m0s`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Issuer that should sign this request
    pub issuer_ref: IssuerReference,
    /// PEM encoded x509 certificate signing request
    pub request: ByteString,
    /// Whether a CA certificate is requested
    #[serde(default, rename = "isCA")]
    pub is_ca: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usages: Vec<String>,
}

/// Reference to the issuer responsible for a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// PEM encoded signed certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<ByteString>,
    /// PEM encoded CA certificate, never populated by this issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<ByteString>,
    /// Time (RFC3339) the request first reached a terminal failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_time: Option<String>,
}

impl CertificateRequest {
    /// Conditions currently recorded on the request
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map_or(&[], |status| status.conditions.as_slice())
    }

    /// True when any condition matches the given type and status
    #[must_use]
    pub fn has_condition(&self, condition_type: &str, status: ConditionStatus) -> bool {
        self.conditions()
            .iter()
            .any(|c| c.is(condition_type, status))
    }

    /// The `Ready` condition, if present
    #[must_use]
    pub fn ready_condition(&self) -> Option<&Condition> {
        self.conditions()
            .iter()
            .find(|c| c.r#type == CONDITION_READY)
    }

    /// True once a signed certificate has been written back
    #[must_use]
    pub fn has_certificate(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|status| status.certificate.as_ref())
            .is_some_and(|cert| !cert.0.is_empty())
    }

    /// Mutable status, created empty if the request has none yet
    pub fn status_mut(&mut self) -> &mut CertificateRequestStatus {
        self.status.get_or_insert_with(CertificateRequestStatus::default)
    }
}

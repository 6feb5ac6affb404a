//! # Custom Resource Definitions
//!
//! Resource types handled by the issuer.
//!
//! ## Module Structure
//!
//! - `issuer.rs` - `OriginIssuer` and `OriginClusterIssuer`, owned by this controller
//! - `certificate_request.rs` - the subset of cert-manager's `CertificateRequest` we read and write
//! - `condition.rs` - status conditions shared by all of the above

mod certificate_request;
mod condition;
mod issuer;

pub use certificate_request::{
    CertificateRequest, CertificateRequestSpec, CertificateRequestStatus, IssuerReference,
    CONDITION_APPROVED, CONDITION_DENIED, REASON_DENIED, REASON_FAILED, REASON_ISSUED,
    REASON_PENDING,
};
pub use condition::{Condition, ConditionStatus, CONDITION_READY};
pub use issuer::{
    IssuerKind, OriginClusterIssuer, OriginClusterIssuerSpec, OriginIssuer,
    OriginIssuerAuthentication, OriginIssuerSpec, OriginIssuerStatus, RequestType,
    SecretKeySelector, REASON_ERROR, REASON_NOT_FOUND, REASON_VERIFIED,
};

//! Common test utilities for issuer integration tests
//!
//! Provides rustls setup for the Pact tests and fixtures for reconciler
//! tests: CSRs, issuers, secrets, certificate requests and a context backed
//! by the in-memory store and a fake signer.

#![allow(dead_code, reason = "each test binary uses a different subset of the helpers")]

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use origin_ca_issuer::cfapi::fake::FakeSigner;
use origin_ca_issuer::cfapi::{self, ApiError, SignResponse, Signer};
use origin_ca_issuer::controller::clock::FixedClock;
use origin_ca_issuer::controller::{Context, ReconcileOptions};
use origin_ca_issuer::crd::{
    CertificateRequest, CertificateRequestSpec, Condition, ConditionStatus, IssuerReference,
    OriginClusterIssuer, OriginClusterIssuerSpec, OriginIssuer, OriginIssuerAuthentication,
    OriginIssuerSpec, OriginIssuerStatus, SecretKeySelector, CONDITION_APPROVED,
    CONDITION_READY,
};
use origin_ca_issuer::provisioners::Collection;
use origin_ca_issuer::store::InMemoryStore;
use std::collections::BTreeMap;
use std::sync::{Arc, Once};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Must run before any async operation that uses rustls.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

pub const NAMESPACE: &str = "default";
pub const SECRET_NAME: &str = "service-key";
pub const SECRET_KEY: &str = "key";
pub const SERVICE_KEY: &str = "v1.0-FFFF-FFFF";
pub const CERTIFICATE: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

/// Time reported by the fixed clock of every test context
pub fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

/// PEM encoded CSR for the given DNS names
pub fn csr(names: &[&str]) -> Vec<u8> {
    let key = rcgen::KeyPair::generate().expect("key generation");
    let params = rcgen::CertificateParams::new(
        names.iter().map(|name| (*name).to_string()).collect::<Vec<_>>(),
    )
    .expect("certificate params");
    params
        .serialize_request(&key)
        .expect("serialize CSR")
        .pem()
        .expect("CSR to PEM")
        .into_bytes()
}

pub fn sign_response() -> SignResponse {
    SignResponse {
        id: "328578533902268680674135037975144138716".to_string(),
        certificate: CERTIFICATE.to_string(),
        hostnames: vec!["example.com".to_string()],
        expiration: now(),
        request_type: "origin-ecc".to_string(),
        validity: 7,
        csr: String::new(),
    }
}

pub fn api_error() -> ApiError {
    ApiError {
        code: 9001,
        message: "Over Nine Thousand!".to_string(),
        ray_id: "0123456789abcdef-ABC".to_string(),
    }
}

fn meta(namespace: Option<&str>, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        generation: Some(1),
        ..Default::default()
    }
}

fn auth(namespace: &str) -> OriginIssuerAuthentication {
    OriginIssuerAuthentication {
        service_key_ref: SecretKeySelector {
            name: SECRET_NAME.to_string(),
            namespace: namespace.to_string(),
            key: SECRET_KEY.to_string(),
        },
    }
}

pub fn ready_status() -> OriginIssuerStatus {
    OriginIssuerStatus {
        conditions: vec![Condition {
            r#type: CONDITION_READY.to_string(),
            status: ConditionStatus::True,
            last_transition_time: Some("2025-12-31T00:00:00Z".to_string()),
            reason: Some("Verified".to_string()),
            message: Some("verified".to_string()),
            observed_generation: Some(1),
        }],
    }
}

/// Namespaced issuer in [`NAMESPACE`] reading the default service key secret
pub fn origin_issuer(name: &str, request_type: &str) -> OriginIssuer {
    let mut issuer = OriginIssuer::new(
        name,
        OriginIssuerSpec {
            request_type: request_type.to_string(),
            auth: auth(""),
        },
    );
    issuer.metadata = meta(Some(NAMESPACE), name);
    issuer
}

/// Cluster issuer reading the service key secret from `secret_namespace`
pub fn cluster_issuer(name: &str, request_type: &str, secret_namespace: &str) -> OriginClusterIssuer {
    let mut issuer = OriginClusterIssuer::new(
        name,
        OriginClusterIssuerSpec {
            request_type: request_type.to_string(),
            auth: auth(secret_namespace),
        },
    );
    issuer.metadata = meta(None, name);
    issuer
}

pub fn secret(namespace: &str, data: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: meta(Some(namespace), SECRET_NAME),
        data: Some(
            data.iter()
                .map(|(key, value)| ((*key).to_string(), ByteString(value.as_bytes().to_vec())))
                .collect::<BTreeMap<_, _>>(),
        ),
        ..Default::default()
    }
}

fn condition(condition_type: &str, status: ConditionStatus, reason: &str) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status,
        last_transition_time: Some("2025-12-31T00:00:00Z".to_string()),
        reason: Some(reason.to_string()),
        message: Some(String::new()),
        observed_generation: None,
    }
}

/// Approved request in [`NAMESPACE`] referencing an issuer of `kind`
pub fn certificate_request(name: &str, kind: &str, issuer: &str) -> CertificateRequest {
    let mut request = CertificateRequest::new(
        name,
        CertificateRequestSpec {
            duration: None,
            issuer_ref: IssuerReference {
                name: issuer.to_string(),
                kind: kind.to_string(),
                group: "cert-manager.k8s.cloudflare.com".to_string(),
            },
            request: ByteString(csr(&["example.com"])),
            is_ca: false,
            usages: Vec::new(),
        },
    );
    request.metadata = meta(Some(NAMESPACE), name);
    with_condition(
        &mut request,
        condition(CONDITION_APPROVED, ConditionStatus::True, "cert-manager.io"),
    );
    request
}

pub fn with_condition(request: &mut CertificateRequest, condition: Condition) {
    request.status_mut().conditions.push(condition);
}

pub fn denied(request: &mut CertificateRequest) {
    with_condition(
        request,
        condition("Denied", ConditionStatus::True, "policy.cert-manager.io"),
    );
}

pub fn ready(request: &mut CertificateRequest, status: ConditionStatus, reason: &str) {
    with_condition(request, condition(CONDITION_READY, status, reason));
}

/// Everything a reconciler test needs to drive and inspect a reconciliation
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub signer: Arc<FakeSigner>,
    pub collection: Arc<Collection>,
    pub ctx: Context,
}

impl Harness {
    pub fn new(response: Result<SignResponse, ApiError>) -> Self {
        Self::with_options(response, ReconcileOptions::default())
    }

    pub fn with_options(response: Result<SignResponse, ApiError>, options: ReconcileOptions) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let signer = Arc::new(FakeSigner::new(response));
        let collection = Arc::new(Collection::new());

        let factory_signer = Arc::clone(&signer);
        let factory = move |_service_key: &[u8]| -> Result<Arc<dyn Signer>, cfapi::Error> {
            Ok(Arc::clone(&factory_signer) as Arc<dyn Signer>)
        };

        let ctx = Context::new(
            Arc::clone(&store) as _,
            Arc::new(factory),
            Arc::clone(&collection),
            options,
        )
        .with_clock(Arc::new(FixedClock(now())));

        Self {
            store,
            signer,
            collection,
            ctx,
        }
    }

    /// Replace the factory with one that always fails to build a client
    pub fn with_failing_factory(mut self) -> Self {
        let factory = |_service_key: &[u8]| -> Result<Arc<dyn Signer>, cfapi::Error> {
            Err(cfapi::Error::InvalidEndpoint {
                endpoint: "::".to_string(),
                reason: "relative URL without a base".to_string(),
            })
        };
        self.ctx.factory = Arc::new(factory);
        self
    }
}

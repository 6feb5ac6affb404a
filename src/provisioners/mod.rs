//! # Provisioners
//!
//! A [`Provisioner`] binds an Origin CA signer to the request type configured
//! on an issuer. It turns a certificate signing request into an Origin CA
//! signing call:
//!
//! 1. The DNS names of the CSR become the requested hostnames
//! 2. The requested duration is normalized to the closest validity the
//!    Origin CA accepts, which may differ considerably from the request
//! 3. The request type is mapped to its wire token
//!
//! Provisioners are cached per issuer in a [`Collection`].

mod collection;

pub use collection::Collection;

use crate::cfapi::{self, SignRequest, Signer};
use crate::constants::{ALLOWED_VALIDITY_DAYS, DEFAULT_VALIDITY_DAYS};
use crate::crd::RequestType;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::{FromDer, X509CertificationRequest};

#[derive(Debug, Error)]
pub enum ProvisionerError {
    #[error("failed to decode CSR for signing: {0}")]
    DecodeCsr(String),
    #[error("unable to sign request: {0}")]
    Sign(#[source] cfapi::Error),
}

/// Signs certificate requests with one Origin CA signer and request type
pub struct Provisioner {
    signer: Arc<dyn Signer>,
    request_type: RequestType,
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner")
            .field("request_type", &self.request_type)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    #[must_use]
    pub fn new(signer: Arc<dyn Signer>, request_type: RequestType) -> Self {
        Self {
            signer,
            request_type,
        }
    }

    #[must_use]
    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    /// Sign a PEM encoded CSR, returning the PEM encoded certificate.
    ///
    /// Without a duration the default validity of 7 days is requested.
    ///
    /// # Errors
    /// Returns an error if the CSR cannot be decoded or the Origin CA rejects
    /// the request
    pub async fn sign(
        &self,
        csr: &[u8],
        duration: Option<chrono::Duration>,
    ) -> Result<Vec<u8>, ProvisionerError> {
        let hostnames = dns_names(csr)?;
        let validity = duration.map_or(DEFAULT_VALIDITY_DAYS, |duration| {
            closest(duration.num_hours() / 24, &ALLOWED_VALIDITY_DAYS)
        });

        debug!(
            hostnames = ?hostnames,
            validity,
            request_type = %self.request_type,
            "signing certificate request"
        );

        let response = self
            .signer
            .sign(&SignRequest {
                hostnames,
                validity,
                request_type: self.request_type.wire_token().to_string(),
                csr: String::from_utf8_lossy(csr).into_owned(),
            })
            .await
            .map_err(ProvisionerError::Sign)?;

        Ok(response.certificate.into_bytes())
    }
}

/// DNS subject alternative names requested by a PEM encoded CSR
fn dns_names(csr: &[u8]) -> Result<Vec<String>, ProvisionerError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(csr)
        .map_err(|e| ProvisionerError::DecodeCsr(format!("error decoding PEM block: {e}")))?;
    let (_, request) = X509CertificationRequest::from_der(&pem.contents)
        .map_err(|e| ProvisionerError::DecodeCsr(e.to_string()))?;

    let mut names = Vec::new();
    if let Some(extensions) = request.requested_extensions() {
        for extension in extensions {
            if let ParsedExtension::SubjectAlternativeName(san) = extension {
                names.extend(san.general_names.iter().filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some((*dns).to_string()),
                    _ => None,
                }));
            }
        }
    }

    Ok(names)
}

/// The entry of `valid` closest to `of`; the earliest entry wins a tie.
///
/// Returns `of` unchanged when `valid` is empty.
#[must_use]
pub fn closest(of: i64, valid: &[i64]) -> i64 {
    let mut best = of;
    let mut min = u64::MAX;

    for &candidate in valid {
        let diff = candidate.abs_diff(of);
        if diff < min {
            min = diff;
            best = candidate;
        }
    }

    best
}

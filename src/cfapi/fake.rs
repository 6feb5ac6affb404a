//! In-process [`Signer`] used by tests in place of the live API.

use super::{ApiError, Error, SignRequest, SignResponse, Signer};
use async_trait::async_trait;
use std::sync::Mutex;

/// A signer that answers every request with a fixed response and records
/// what it was asked to sign
#[derive(Debug)]
pub struct FakeSigner {
    response: Result<SignResponse, ApiError>,
    requests: Mutex<Vec<SignRequest>>,
}

impl FakeSigner {
    #[must_use]
    pub fn new(response: Result<SignResponse, ApiError>) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first
    #[must_use]
    pub fn requests(&self) -> Vec<SignRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Signer for FakeSigner {
    async fn sign(&self, request: &SignRequest) -> Result<SignResponse, Error> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.response.clone().map_err(Error::Api)
    }
}

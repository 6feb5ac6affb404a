//! # Origin CA API Client
//!
//! REST client for the Origin CA signing endpoint
//! (`POST /client/v4/certificates`).
//!
//! Every call is a single JSON `POST` authenticated with the raw service key in
//! the `X-Auth-User-Service-Key` header. Responses use the standard API envelope:
//!
//! ```json
//! { "success": true, "errors": [], "messages": [], "result": { ... } }
//! ```
//!
//! When `success` is false the first entry of `errors` is returned as an
//! [`ApiError`], tagged with the `CF-Ray` header of the response so failures can
//! be traced on the CA side.

mod expiration;
#[cfg(any(test, feature = "testing"))]
pub mod fake;

use crate::constants::{
    DEFAULT_API_ENDPOINT, RAY_ID_HEADER, SERVICE_KEY_HEADER, SIGN_PATH, USER_AGENT,
};
use crate::observability::metrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderValue, USER_AGENT as USER_AGENT_HEADER};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info_span, Instrument};
use zeroize::Zeroizing;

pub use expiration::{parse_expiration, ExpirationError};

/// Errors returned by the Origin CA client
#[derive(Debug, Error)]
pub enum Error {
    /// The API answered with `success: false`
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("request to Origin CA failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unable to decode Origin CA response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("service key is not a valid HTTP header value: {0}")]
    InvalidServiceKey(#[source] reqwest::header::InvalidHeaderValue),
    #[error("invalid Origin CA endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Error entry reported by the API, tagged with the request's ray id
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("Cloudflare API Error code={code} message={message} ray_id={ray_id}")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
    #[serde(skip)]
    pub ray_id: String,
}

/// Body of a signing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    pub hostnames: Vec<String>,
    #[serde(rename = "requested_validity")]
    pub validity: i64,
    #[serde(rename = "request_type")]
    pub request_type: String,
    pub csr: String,
}

/// Signed certificate returned in the `result` of a successful response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignResponse {
    pub id: String,
    pub certificate: String,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(rename = "expires_on", deserialize_with = "expiration::deserialize")]
    pub expiration: DateTime<Utc>,
    #[serde(rename = "request_type")]
    pub request_type: String,
    #[serde(rename = "requested_validity")]
    pub validity: i64,
    #[serde(default)]
    pub csr: String,
}

/// Response envelope shared by all API endpoints
#[derive(Debug, Deserialize)]
struct ApiResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    #[serde(default)]
    #[allow(dead_code, reason = "part of the envelope, never inspected")]
    messages: Vec<serde_json::Value>,
    #[serde(default)]
    result: serde_json::Value,
}

/// Anything able to sign a request against the Origin CA
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, request: &SignRequest) -> Result<SignResponse, Error>;
}

/// Builds a [`Signer`] from raw service key bytes
pub trait Factory: Send + Sync {
    /// # Errors
    /// Returns an error if no client can be built for the given key
    fn api_with(&self, service_key: &[u8]) -> Result<Arc<dyn Signer>, Error>;
}

impl<F> Factory for F
where
    F: Fn(&[u8]) -> Result<Arc<dyn Signer>, Error> + Send + Sync,
{
    fn api_with(&self, service_key: &[u8]) -> Result<Arc<dyn Signer>, Error> {
        self(service_key)
    }
}

/// Origin CA REST client bound to one service key
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
    service_key: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint.as_str())
            .field("service_key", &"***")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client for the default endpoint
    ///
    /// # Errors
    /// Returns an error if the service key cannot be sent as a header value
    pub fn new(service_key: &[u8], http: reqwest::Client) -> Result<Self, Error> {
        HeaderValue::from_bytes(service_key).map_err(Error::InvalidServiceKey)?;

        Ok(Self {
            http,
            endpoint: endpoint_from(DEFAULT_API_ENDPOINT)?,
            service_key: Zeroizing::new(service_key.to_vec()),
        })
    }

    /// Point the client at another host; the signing path is always kept
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn service_key_header(&self) -> Result<HeaderValue, Error> {
        let mut value =
            HeaderValue::from_bytes(&self.service_key).map_err(Error::InvalidServiceKey)?;
        value.set_sensitive(true);
        Ok(value)
    }

    async fn send(&self, request: &SignRequest) -> Result<SignResponse, Error> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(USER_AGENT_HEADER, USER_AGENT)
            .header(SERVICE_KEY_HEADER, self.service_key_header()?)
            .json(request)
            .send()
            .await?;

        let ray_id = response
            .headers()
            .get(RAY_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let status = response.status();
        let body = response.bytes().await?;

        debug!(
            http.status = status.as_u16(),
            ray_id = %ray_id,
            "received Origin CA response"
        );

        let envelope: ApiResponse = serde_json::from_slice(&body)?;
        if !envelope.success {
            let mut error = envelope.errors.into_iter().next().unwrap_or(ApiError {
                code: 0,
                message: "unknown error".to_string(),
                ray_id: String::new(),
            });
            error.ray_id = ray_id;
            return Err(Error::Api(error));
        }

        Ok(serde_json::from_value(envelope.result)?)
    }
}

#[async_trait]
impl Signer for Client {
    async fn sign(&self, request: &SignRequest) -> Result<SignResponse, Error> {
        let span = info_span!(
            "cfapi.sign",
            hostnames = request.hostnames.len(),
            validity = request.validity,
            request_type = %request.request_type
        );
        let start = Instant::now();

        let result = self.send(request).instrument(span).await;

        metrics::observe_ca_request_duration(start.elapsed().as_secs_f64());
        metrics::increment_ca_requests(match &result {
            Ok(_) => "success",
            Err(Error::Api(_)) => "api_error",
            Err(_) => "error",
        });

        result
    }
}

/// Parse an endpoint override, keeping only scheme, host and port
///
/// # Errors
/// Returns an error if the endpoint is not an absolute URL
pub fn endpoint_from(endpoint: &str) -> Result<Url, Error> {
    let mut url = Url::parse(endpoint).map_err(|e| Error::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "endpoint must be an absolute http(s) URL".to_string(),
        });
    }
    url.set_path(SIGN_PATH);
    url.set_query(None);
    Ok(url)
}

/// Factory producing [`Client`]s that share one HTTP connection pool
#[derive(Debug, Clone)]
pub struct ClientFactory {
    http: reqwest::Client,
    endpoint: Option<Url>,
}

impl ClientFactory {
    #[must_use]
    pub fn new(http: reqwest::Client, endpoint: Option<Url>) -> Self {
        Self { http, endpoint }
    }
}

impl Factory for ClientFactory {
    fn api_with(&self, service_key: &[u8]) -> Result<Arc<dyn Signer>, Error> {
        let mut client = Client::new(service_key, self.http.clone())?;
        if let Some(endpoint) = &self.endpoint {
            client = client.with_endpoint(endpoint.clone());
        }
        Ok(Arc::new(client))
    }
}

//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! command-line flags or environment variables where applicable.

/// API group served by this issuer
pub const API_GROUP: &str = "cert-manager.k8s.cloudflare.com";

/// Field manager name used for status writes
pub const FIELD_MANAGER: &str = "origin-ca-issuer";

/// User-Agent sent on every Origin CA request
pub const USER_AGENT: &str = "github.com/cloudflare/origin-ca-issuer";

/// Default Origin CA signing endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://api.cloudflare.com/client/v4/certificates";

/// Path of the signing endpoint, kept when the endpoint host is overridden
pub const SIGN_PATH: &str = "/client/v4/certificates";

/// Header carrying the Origin CA service key
pub const SERVICE_KEY_HEADER: &str = "X-Auth-User-Service-Key";

/// Response header carrying the per-request trace identifier
pub const RAY_ID_HEADER: &str = "CF-Ray";

/// Validity (days) requested when a CertificateRequest carries no duration
pub const DEFAULT_VALIDITY_DAYS: i64 = 7;

/// Validity tiers (days) accepted by the Origin CA, in scan order
pub const ALLOWED_VALIDITY_DAYS: [i64; 7] = [7, 30, 90, 365, 730, 1095, 5475];

/// Default HTTP server port for metrics and health checks
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default upper bound on a single reconciliation (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 60;

/// Default timeout for a single Origin CA request (seconds)
pub const DEFAULT_CA_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of reconciliations that may run at once per controller
pub const DEFAULT_MAX_CONCURRENT_RECONCILES: u16 = 10;

/// Fibonacci backoff bounds for failed reconciliations (minutes)
pub const BACKOFF_MIN_MINUTES: u64 = 1;
pub const BACKOFF_MAX_MINUTES: u64 = 10;

/// Backoff state of a resource that has not failed for this long is dropped
/// (minutes); deleted resources are never reconciled again to clear it
pub const BACKOFF_STATE_TTL_MINUTES: u64 = 3 * BACKOFF_MAX_MINUTES;

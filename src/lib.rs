//! # Origin CA Issuer
//!
//! A cert-manager external issuer that signs `CertificateRequest`s with the
//! Cloudflare Origin CA.
//!
//! - `crd`: `OriginIssuer`, `OriginClusterIssuer` and the `CertificateRequest` subset we use
//! - `cfapi`: Origin CA REST client
//! - `provisioners`: signing sessions and their per-issuer cache
//! - `controller`: issuer readiness and certificate request reconcilers
//! - `store`: object store contract with Kubernetes and in-memory backends
//! - `runtime`: kube-runtime controller wiring and error policy
//! - `config`, `observability`, `server`: flags, metrics and health checks

pub mod cfapi;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod provisioners;
pub mod runtime;
pub mod server;
pub mod store;

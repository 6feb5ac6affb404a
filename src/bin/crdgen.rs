//! # CRD Generator
//!
//! Prints the `OriginIssuer` and `OriginClusterIssuer` CustomResourceDefinitions
//! as a multi-document YAML stream.
//!
//! ```bash
//! cargo run --bin crdgen > deploy/crds/origin-issuer.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::core::CustomResourceExt;
use origin_ca_issuer::crd::{OriginClusterIssuer, OriginIssuer};

fn main() {
    let crds = [OriginIssuer::crd(), OriginClusterIssuer::crd()];

    for crd in &crds {
        match serde_yaml::to_string(crd) {
            Ok(yaml) => {
                println!("---");
                print!("{yaml}");
            }
            Err(e) => {
                eprintln!("Failed to serialize CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }
}

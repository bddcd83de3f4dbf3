//! # CRD Generator
//!
//! Prints the `VaultSecret` CustomResourceDefinition as YAML.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/vaultsecret.yaml
//!
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use kube::CustomResourceExt;

use vault_secret_controller::crd::VaultSecret;

fn main() -> Result<()> {
    let crd = serde_yaml::to_string(&VaultSecret::crd()).context("Failed to serialize CRD")?;
    print!("{crd}");
    Ok(())
}

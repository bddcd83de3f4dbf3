//! # Custom Resource Definitions
//!
//! CRD types for the Vault Secret Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `VaultSecret` specification and default values
//! - `auth.rs` - Vault connection and authentication descriptors
//! - `status.rs` - Per-entry status reporting

mod auth;
mod spec;
mod status;

pub use auth::{AppRoleAuth, KubernetesAuth, VaultAuth, VaultConfig};
pub use spec::{SecretEntry, VaultSecret, VaultSecretSpec};
pub use status::{StatusEntry, VaultSecretStatus};

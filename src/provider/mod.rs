//! # Provider Modules
//!
//! Secret backend abstractions.
//!
//! The controller talks to Vault only through two seams:
//! - `VaultConnector` builds an unauthenticated transport for a connection descriptor
//! - `VaultTransport` performs logical reads and writes against the Vault HTTP API
//!
//! `vault::HttpConnector` is the production implementation. Tests substitute
//! in-memory transports.

use async_trait::async_trait;
use serde_json::Value;

use crate::crd::VaultConfig;

pub mod vault;

pub use vault::errors::{AuthError, VaultError};
pub use vault::responses::LogicalResponse;

/// Logical Vault API, equivalent to `vault read` / `vault write`
#[async_trait]
pub trait VaultTransport: Send + Sync + Sized {
    /// Read `path` (relative to `/v1/`)
    /// Returns `Ok(None)` when Vault has nothing to report for the path
    async fn read(&self, path: &str) -> Result<Option<LogicalResponse>, VaultError>;

    /// Write `body` to `path` (relative to `/v1/`)
    async fn write(&self, path: &str, body: Value) -> Result<Option<LogicalResponse>, VaultError>;

    /// Copy of this transport that authenticates with `token`
    #[must_use]
    fn with_token(&self, token: &str) -> Self;
}

/// Builds transports for a Vault connection descriptor
pub trait VaultConnector: Send + Sync {
    type Transport: VaultTransport;

    /// Create an unauthenticated transport
    fn connect(&self, config: &VaultConfig) -> Result<Self::Transport, VaultError>;
}

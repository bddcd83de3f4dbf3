//! # Vault Provider
//!
//! HashiCorp Vault KV backend.
//!
//! ## Module Structure
//!
//! - `client.rs` - reqwest based `VaultTransport` and its connector
//! - `auth.rs` - authentication method selection and login
//! - `reader.rs` - KV version 1 / version 2 aware reads
//! - `cache.rs` - per-reconcile read deduplication
//! - `errors.rs` - error taxonomy
//! - `responses.rs` - Vault API payloads

pub mod auth;
pub mod cache;
pub mod client;
pub mod errors;
pub mod reader;
pub mod responses;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{select_auth_method, AuthMethod, TokenSource};
pub use cache::CachedReader;
pub use client::{HttpConnector, HttpVaultClient};
pub use reader::{join_path, FieldMap, KvProbe, KvReader, KvVersion};

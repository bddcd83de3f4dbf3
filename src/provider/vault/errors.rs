//! # Vault Errors

use thiserror::Error;

/// Failure to read from or write to Vault
#[derive(Debug, Error)]
pub enum VaultError {
    /// Vault answered without error but with no payload
    #[error("Path {0} not found")]
    PathNotFound(String),

    #[error("unknown version {0}")]
    UnknownVersion(i64),

    /// A version 1 read hit a version 2 mount
    #[error("{warning} (path {path} is served by a versioned K/V engine, set kvVersion to 2 or 0)")]
    VersionMismatch { path: String, warning: String },

    #[error("request to Vault path {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Vault returned HTTP {status} for {path}: {message}")]
    Http {
        path: String,
        status: u16,
        message: String,
    },

    #[error("failed to decode Vault response for {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected Vault response for {path}: {reason}")]
    UnexpectedShape { path: String, reason: String },

    #[error("invalid Vault client configuration: {0}")]
    Config(String),
}

/// Failure to obtain an authenticated Vault session
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Cannot find a way to authenticate, please choose between Token, AppRole or Kubernetes")]
    NoMethodConfigured,

    #[error("unable to read token of service account {namespace}/{service_account}: {reason}")]
    ServiceAccount {
        namespace: String,
        service_account: String,
        reason: String,
    },

    #[error("Token is empty, please provide a valid jwt token")]
    EmptyJwt,

    #[error("login on auth/{mount} did not return a client token")]
    MissingClientToken { mount: String },

    #[error("login on auth/{mount} failed: {source}")]
    Login {
        mount: String,
        #[source]
        source: VaultError,
    },

    #[error("unable to create Vault client: {0}")]
    Connect(#[source] VaultError),
}

impl AuthError {
    /// Errors that another attempt with the same spec cannot fix
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoMethodConfigured)
    }
}

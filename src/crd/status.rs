//! # VaultSecret Status

use serde::{Deserialize, Serialize};

/// Status of the VaultSecret resource
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultSecretStatus {
    /// One entry per `spec.secrets` item, sorted by Secret key
    #[serde(default)]
    pub entries: Vec<StatusEntry>,
}

/// Outcome of reading a single entry from Vault
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    /// The entry this status refers to
    pub secret: crate::crd::SecretEntry,
    /// Whether the value was read and stored
    pub status: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub root_error: String,
}

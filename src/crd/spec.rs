//! # VaultSecret Spec
//!
//! Main CRD specification types and default values.

use std::collections::BTreeMap;

use kube::ResourceExt;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SECRET_TYPE;

/// VaultSecret Custom Resource Definition
///
/// Describes a Kubernetes Secret whose data is read from one or more
/// HashiCorp Vault KV paths.
///
/// # Example
///
/// ```yaml
/// apiVersion: maupu.org/v1beta1
/// kind: VaultSecret
/// metadata:
///   name: database
///   namespace: default
/// spec:
///   config:
///     addr: https://vault.example.com:8200
///     auth:
///       kubernetes:
///         role: my-app
///         cluster: kubernetes
///   secrets:
///     - secretKey: password
///       kvPath: secret
///       path: my-app/database
///       field: password
///   syncPeriod: 5m
/// ```
#[derive(
    kube::CustomResource, Debug, Clone, Deserialize, Serialize, PartialEq, schemars::JsonSchema,
)]
#[kube(
    kind = "VaultSecret",
    group = "maupu.org",
    version = "v1beta1",
    namespaced,
    status = "crate::crd::VaultSecretStatus",
    shortname = "vs",
    printcolumn = r#"{"name":"Secret", "type":"string", "jsonPath":".spec.secretName"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VaultSecretSpec {
    /// Vault connection and authentication
    pub config: crate::crd::VaultConfig,
    /// Fields to read from Vault, one Secret key each
    #[serde(default)]
    pub secrets: Vec<SecretEntry>,
    /// Name of the Secret to manage
    /// Default: the VaultSecret's own name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    /// Type of the Secret to manage
    /// Default: "Opaque"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
    /// Labels added to the Secret, they take precedence over controller labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_labels: Option<BTreeMap<String, String>>,
    /// Annotations of the Secret, replaced wholesale on every sync
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_annotations: Option<BTreeMap<String, String>>,
    /// Resync period
    /// Format: Go duration string (e.g., "30s", "5m", "1h30m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_period: Option<String>,
}

/// One Secret key sourced from one Vault field
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretEntry {
    /// Key in the generated Secret
    pub secret_key: String,
    /// Mount path of the KV engine (e.g., "secret")
    pub kv_path: String,
    /// Item path inside the mount
    pub path: String,
    /// Field of the Vault item to copy
    pub field: String,
    /// KV engine version: 1, 2, or 0 to detect it
    #[serde(default)]
    pub kv_version: i64,
}

impl VaultSecret {
    /// Name of the Secret materialized for this resource
    pub fn target_secret_name(&self) -> String {
        self.spec
            .secret_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map_or_else(|| self.name_any(), str::to_string)
    }

    /// Type of the Secret materialized for this resource
    pub fn target_secret_type(&self) -> &str {
        self.spec
            .secret_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_SECRET_TYPE)
    }
}

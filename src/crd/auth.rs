//! # Vault Connection
//!
//! Connection and authentication descriptors embedded in the `VaultSecret` spec.
//!
//! Credential fields are redacted from `Debug` output.

use serde::{Deserialize, Serialize};

/// Vault server connection
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    /// Vault address (e.g., "https://vault.example.com:8200")
    pub addr: String,
    /// Vault Enterprise namespace, sent as `X-Vault-Namespace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
    /// Authentication method, first configured one wins: token, approle, kubernetes
    #[serde(default)]
    pub auth: VaultAuth,
}

/// Authentication descriptor
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultAuth {
    /// Static Vault token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Kubernetes service account authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<KubernetesAuth>,
    /// AppRole authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approle: Option<AppRoleAuth>,
}

impl std::fmt::Debug for VaultAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultAuth")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("kubernetes", &self.kubernetes)
            .field("approle", &self.approle)
            .finish()
    }
}

/// Kubernetes auth method
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesAuth {
    /// Vault role to log in as
    #[serde(default)]
    pub role: String,
    /// Mount path of the Kubernetes auth method in Vault
    #[serde(default)]
    pub cluster: String,
    /// Service account whose token is exchanged
    /// Default: "default"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    /// Namespace of the service account
    /// Default: the VaultSecret's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_namespace: Option<String>,
}

/// AppRole auth method
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppRoleAuth {
    /// Mount path of the AppRole auth method
    /// Default: "approle"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub role_id: String,
    #[serde(default)]
    pub secret_id: String,
}

impl std::fmt::Debug for AppRoleAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRoleAuth")
            .field("name", &self.name)
            .field("role_id", &self.role_id)
            .field("secret_id", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_credentials() {
        let auth = VaultAuth {
            token: Some("s.supersecret".to_string()),
            kubernetes: None,
            approle: Some(AppRoleAuth {
                name: None,
                role_id: "role".to_string(),
                secret_id: "hunter2".to_string(),
            }),
        };
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("s.supersecret"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("role"));
    }
}

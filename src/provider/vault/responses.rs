//! # Response Types
//!
//! Vault HTTP API response structures.
//!
//! References:
//! - [Vault HTTP API](https://developer.hashicorp.com/vault/api-docs)

use serde::Deserialize;
use serde_json::{Map, Value};

/// Envelope shared by every logical read/write response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogicalResponse {
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub auth: Option<AuthInfo>,
}

impl LogicalResponse {
    /// First warning containing `needle`
    pub fn warning_containing(&self, needle: &str) -> Option<&str> {
        self.warnings
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|warning| warning.contains(needle))
            .map(String::as_str)
    }

    /// Whether the response carries anything at all
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
            && self.auth.is_none()
            && self.warnings.as_ref().is_none_or(Vec::is_empty)
    }
}

/// `auth` block of a login response
#[derive(Clone, Default, Deserialize)]
pub struct AuthInfo {
    #[serde(default)]
    pub client_token: String,
    #[serde(default)]
    pub accessor: String,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
}

impl std::fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInfo")
            .field("client_token", &"<redacted>")
            .field("accessor", &self.accessor)
            .field("policies", &self.policies)
            .field("lease_duration", &self.lease_duration)
            .field("renewable", &self.renewable)
            .finish()
    }
}

/// Body of a non-2xx response
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_warning_lookup() {
        let response: LogicalResponse = serde_json::from_value(json!({
            "data": null,
            "warnings": [
                "Invalid path for a versioned K/V secrets engine. See the API docs for the appropriate API endpoints to use."
            ]
        }))
        .expect("response should decode");

        assert!(response
            .warning_containing("Invalid path for a versioned K/V secrets engine.")
            .is_some());
        assert!(response.warning_containing("something else").is_none());
        assert!(!response.is_empty());
    }

    #[test]
    fn test_empty_response() {
        let response: LogicalResponse =
            serde_json::from_value(json!({ "errors": [] })).expect("response should decode");
        assert!(response.is_empty());
    }
}

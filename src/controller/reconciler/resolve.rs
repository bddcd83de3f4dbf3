//! # Secret Resolution
//!
//! Reads every `spec.secrets` entry from Vault and produces the Secret data
//! together with one status entry per item.
//!
//! Entries are processed in ascending Secret key order. A failed entry never
//! aborts the pass; it is reported through its status entry only.

use std::collections::BTreeMap;

use k8s_openapi::ByteString;
use kube::ResourceExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::{STATUS_MESSAGE_FIELD_MISSING, STATUS_MESSAGE_READ_FAILED};
use crate::crd::{SecretEntry, StatusEntry, VaultSecret};
use crate::observability::metrics;
use crate::provider::vault::{select_auth_method, CachedReader, KvVersion, TokenSource};
use crate::provider::{AuthError, VaultConnector, VaultTransport};

/// Values and per-entry outcomes of one resolution pass
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Resolution {
    pub values: BTreeMap<String, ByteString>,
    pub entries: Vec<StatusEntry>,
}

impl Resolution {
    /// Number of entries that could not be resolved
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.status).count()
    }
}

/// Select the authentication method of `vault_secret`, connect and log in
pub async fn open_session<C, S>(
    connector: &C,
    tokens: &S,
    vault_secret: &VaultSecret,
) -> Result<C::Transport, AuthError>
where
    C: VaultConnector,
    S: TokenSource + ?Sized,
{
    let namespace = vault_secret.namespace().unwrap_or_default();
    let method = select_auth_method(&vault_secret.spec.config.auth, &namespace)?;
    let transport = connector
        .connect(&vault_secret.spec.config)
        .map_err(AuthError::Connect)?;

    match method.login(&transport, tokens).await {
        Ok(session) => {
            metrics::increment_vault_logins(method.kind(), "success");
            debug!(auth.method = method.kind(), "vault.auth.login.success");
            Ok(session)
        }
        Err(e) => {
            metrics::increment_vault_logins(method.kind(), "error");
            Err(e)
        }
    }
}

/// Resolve `entries` through an authenticated `session`
pub async fn resolve_entries<T: VaultTransport>(session: &T, entries: &[SecretEntry]) -> Resolution {
    let mut ordered: Vec<&SecretEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| a.secret_key.cmp(&b.secret_key));

    let mut cache = CachedReader::new(session);
    let mut resolution = Resolution::default();

    for entry in ordered {
        let fields = match KvVersion::try_from(entry.kv_version) {
            Ok(version) => cache.read(&entry.kv_path, &entry.path, version).await,
            Err(e) => Err(e),
        };

        let status = match fields {
            Ok(fields) => match fields.get(&entry.field).and_then(field_value) {
                Some(value) => {
                    // Duplicate keys: the last entry in key order wins
                    resolution
                        .values
                        .insert(entry.secret_key.clone(), ByteString(value.into_bytes()));
                    succeeded(entry)
                }
                None => {
                    warn!(
                        kv_path = %entry.kv_path,
                        path = %entry.path,
                        field = %entry.field,
                        "Field does not exist or is empty"
                    );
                    failed(entry, STATUS_MESSAGE_FIELD_MISSING, String::new())
                }
            },
            Err(e) => {
                warn!(
                    kv_path = %entry.kv_path,
                    path = %entry.path,
                    error = %e,
                    "Problem occurred while reading secret"
                );
                failed(entry, STATUS_MESSAGE_READ_FAILED, e.to_string())
            }
        };
        resolution.entries.push(status);
    }

    resolution
}

/// Text stored for a Vault field, `None` when absent or empty
fn field_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn succeeded(entry: &SecretEntry) -> StatusEntry {
    StatusEntry {
        secret: entry.clone(),
        status: true,
        message: String::new(),
        root_error: String::new(),
    }
}

fn failed(entry: &SecretEntry, message: &str, root_error: String) -> StatusEntry {
    StatusEntry {
        secret: entry.clone(),
        status: false,
        message: message.to_string(),
        root_error,
    }
}

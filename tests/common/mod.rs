//! Common test utilities for integration and Pact tests
//!
//! Provides rustls setup plus in-memory doubles of the Kubernetes object
//! store and of the Vault API, so that full reconcile passes run without a
//! cluster or a Vault server.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, Once};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::error::ErrorResponse;
use kube::ResourceExt;
use serde_json::Value;
use vault_secret_controller::config::ControllerConfig;
use vault_secret_controller::controller::filter::LabelFilter;
use vault_secret_controller::controller::rate_gate::UpdateRateGate;
use vault_secret_controller::controller::reconciler::{ObjectStore, Reconciler, StoreError};
use vault_secret_controller::crd::{
    SecretEntry, VaultAuth, VaultConfig, VaultSecret, VaultSecretSpec, VaultSecretStatus,
};
use vault_secret_controller::provider::vault::responses::LogicalResponse;
use vault_secret_controller::provider::vault::TokenSource;
use vault_secret_controller::provider::{AuthError, VaultConnector, VaultError, VaultTransport};
use zeroize::Zeroizing;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // The library's own tests may already have installed it
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

pub const NAMESPACE: &str = "apps";

/// A VaultSecret in `NAMESPACE` reading `entries`
pub fn vault_secret(name: &str, auth: VaultAuth, entries: Vec<SecretEntry>) -> VaultSecret {
    let mut vs = VaultSecret::new(
        name,
        VaultSecretSpec {
            config: VaultConfig {
                addr: "https://vault.example.com:8200".to_string(),
                namespace: None,
                insecure: false,
                auth,
            },
            secrets: entries,
            secret_name: None,
            secret_type: None,
            secret_labels: None,
            secret_annotations: None,
            sync_period: Some("1m".to_string()),
        },
    );
    vs.metadata.namespace = Some(NAMESPACE.to_string());
    vs.metadata.uid = Some(format!("uid-{name}"));
    vs
}

pub fn entry(key: &str, mount: &str, path: &str, field: &str) -> SecretEntry {
    SecretEntry {
        secret_key: key.to_string(),
        kv_path: mount.to_string(),
        path: path.to_string(),
        field: field.to_string(),
        kv_version: 0,
    }
}

pub fn token_auth(token: &str) -> VaultAuth {
    VaultAuth {
        token: Some(token.to_string()),
        ..VaultAuth::default()
    }
}

/// Controller configuration with a short rate gate and fast conflict retries
pub fn test_config(min_update_interval_ms: u64) -> ControllerConfig {
    ControllerConfig {
        min_secret_update_interval_ms: min_update_interval_ms,
        conflict_retry_initial_ms: 1,
        conflict_retry_max_ms: 4,
        ..ControllerConfig::default()
    }
}

pub fn reconciler(
    store: InMemoryStore,
    vault: FakeVault,
    config: &ControllerConfig,
) -> Arc<Reconciler<InMemoryStore, FakeVault>> {
    Arc::new(Reconciler::with_parts(
        store,
        vault,
        Arc::new(UpdateRateGate::new(config.min_secret_update_interval())),
        LabelFilter::default(),
        config,
    ))
}

pub fn string_data(secret: &Secret) -> BTreeMap<String, String> {
    secret
        .data
        .as_ref()
        .map(|data| {
            data.iter()
                .map(|(k, v)| (k.clone(), String::from_utf8_lossy(&v.0).into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

fn key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

#[derive(Debug, Default)]
struct StoreState {
    vault_secrets: HashMap<String, VaultSecret>,
    secrets: HashMap<String, Secret>,
    service_account_tokens: HashMap<String, String>,
    next_resource_version: u64,
    status_writes: usize,
    secret_writes: usize,
    pending_conflicts: u32,
    reject_invalid: bool,
    fail_gets: bool,
    fail_status_updates: bool,
}

/// Object store keeping everything in memory
///
/// Replaces are guarded by `resourceVersion` like the API server does.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn with_vault_secret(self, vault_secret: VaultSecret) -> Self {
        let name = vault_secret.name_any();
        let namespace = vault_secret.namespace().unwrap_or_default();
        self.lock()
            .vault_secrets
            .insert(key(&namespace, &name), vault_secret);
        self
    }

    pub fn with_secret(self, mut secret: Secret) -> Self {
        {
            let mut state = self.lock();
            state.next_resource_version += 1;
            secret.metadata.resource_version = Some(state.next_resource_version.to_string());
            let name = secret.name_any();
            let namespace = secret.namespace().unwrap_or_default();
            state.secrets.insert(key(&namespace, &name), secret);
        }
        self
    }

    pub fn with_service_account_token(self, namespace: &str, name: &str, jwt: &str) -> Self {
        self.lock()
            .service_account_tokens
            .insert(key(namespace, name), jwt.to_string());
        self
    }

    /// Fail the next `count` Secret replaces with a conflict
    pub fn inject_conflicts(&self, count: u32) {
        self.lock().pending_conflicts = count;
    }

    /// Reject every Secret write as invalid
    pub fn reject_writes_as_invalid(&self) {
        self.lock().reject_invalid = true;
    }

    /// Fail every read with an API server error
    pub fn fail_gets(&self) {
        self.lock().fail_gets = true;
    }

    /// Fail every status update with an API server error
    pub fn fail_status_updates(&self) {
        self.lock().fail_status_updates = true;
    }

    pub fn update_vault_secret(&self, namespace: &str, name: &str, f: impl FnOnce(&mut VaultSecret)) {
        if let Some(vs) = self.lock().vault_secrets.get_mut(&key(namespace, name)) {
            f(vs);
        }
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.lock().secrets.get(&key(namespace, name)).cloned()
    }

    pub fn status(&self, namespace: &str, name: &str) -> Option<VaultSecretStatus> {
        self.lock()
            .vault_secrets
            .get(&key(namespace, name))
            .and_then(|vs| vs.status.clone())
    }

    pub fn status_writes(&self) -> usize {
        self.lock().status_writes
    }

    pub fn secret_writes(&self) -> usize {
        self.lock().secret_writes
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("store lock poisoned")
    }
}

fn server_error(resource: String) -> StoreError {
    StoreError::from_kube(
        resource,
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "etcdserver: request timed out".to_string(),
            reason: "InternalError".to_string(),
            code: 500,
        }),
    )
}

fn invalid(resource: &str) -> StoreError {
    StoreError::Invalid {
        resource: resource.to_string(),
        message: "rejected by test store".to_string(),
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get_vault_secret(&self, namespace: &str, name: &str) -> Result<VaultSecret, StoreError> {
        let state = self.lock();
        if state.fail_gets {
            return Err(server_error(format!("VaultSecret {}", key(namespace, name))));
        }
        state
            .vault_secrets
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("VaultSecret {}", key(namespace, name))))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        let state = self.lock();
        if state.fail_gets {
            return Err(server_error(format!("Secret {}", key(namespace, name))));
        }
        Ok(state.secrets.get(&key(namespace, name)).cloned())
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, StoreError> {
        let mut state = self.lock();
        let secret_key = key(namespace, &secret.name_any());
        if state.reject_invalid {
            return Err(invalid(&secret_key));
        }
        if state.secrets.contains_key(&secret_key) {
            return Err(StoreError::Conflict {
                resource: secret_key,
                message: "already exists".to_string(),
            });
        }
        state.next_resource_version += 1;
        let mut stored = secret.clone();
        stored.metadata.resource_version = Some(state.next_resource_version.to_string());
        state.secret_writes += 1;
        state.secrets.insert(secret_key, stored.clone());
        Ok(stored)
    }

    async fn replace_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, StoreError> {
        let mut state = self.lock();
        let secret_key = key(namespace, &secret.name_any());
        if state.reject_invalid {
            return Err(invalid(&secret_key));
        }
        if state.pending_conflicts > 0 {
            state.pending_conflicts -= 1;
            return Err(StoreError::Conflict {
                resource: secret_key,
                message: "the object has been modified".to_string(),
            });
        }
        let current_version = state
            .secrets
            .get(&secret_key)
            .and_then(|s| s.metadata.resource_version.clone());
        if current_version.is_none() {
            return Err(StoreError::NotFound(secret_key));
        }
        if current_version != secret.metadata.resource_version {
            return Err(StoreError::Conflict {
                resource: secret_key,
                message: "stale resourceVersion".to_string(),
            });
        }
        state.next_resource_version += 1;
        let mut stored = secret.clone();
        stored.metadata.resource_version = Some(state.next_resource_version.to_string());
        state.secret_writes += 1;
        state.secrets.insert(secret_key, stored.clone());
        Ok(stored)
    }

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: &VaultSecretStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail_status_updates {
            return Err(server_error(format!("VaultSecret {}", key(namespace, name))));
        }
        let vs = state
            .vault_secrets
            .get_mut(&key(namespace, name))
            .ok_or_else(|| StoreError::NotFound(format!("VaultSecret {}", key(namespace, name))))?;
        vs.status = Some(status.clone());
        state.status_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl TokenSource for InMemoryStore {
    async fn service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> Result<Zeroizing<String>, AuthError> {
        self.lock()
            .service_account_tokens
            .get(&key(namespace, service_account))
            .map(|jwt| Zeroizing::new(jwt.clone()))
            .ok_or_else(|| AuthError::ServiceAccount {
                namespace: namespace.to_string(),
                service_account: service_account.to_string(),
                reason: "not found".to_string(),
            })
    }
}

#[derive(Debug, Default)]
struct VaultState {
    reads: HashMap<String, Value>,
    logins: HashMap<String, String>,
    read_log: Vec<(String, Option<String>)>,
    login_log: Vec<String>,
}

/// In-memory Vault, acting as both connector and transport
#[derive(Debug, Clone, Default)]
pub struct FakeVault {
    state: Arc<Mutex<VaultState>>,
    token: Option<String>,
}

impl FakeVault {
    /// Serve `body` as the logical response of `path`
    pub fn with_read(self, path: &str, body: Value) -> Self {
        self.set_read(path, body);
        self
    }

    /// Replace the logical response of `path`
    pub fn set_read(&self, path: &str, body: Value) {
        self.lock().reads.insert(path.to_string(), body);
    }

    /// Answer `auth/{mount}/login` with `client_token`
    pub fn with_login(self, mount: &str, client_token: &str) -> Self {
        self.lock()
            .logins
            .insert(format!("auth/{mount}/login"), client_token.to_string());
        self
    }

    pub fn read_count(&self, path: &str) -> usize {
        self.lock().read_log.iter().filter(|(p, _)| p == path).count()
    }

    /// Tokens presented on reads, in order
    pub fn read_tokens(&self) -> Vec<Option<String>> {
        self.lock().read_log.iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn logins(&self) -> Vec<String> {
        self.lock().login_log.clone()
    }

    fn lock(&self) -> MutexGuard<'_, VaultState> {
        self.state.lock().expect("vault lock poisoned")
    }
}

impl VaultConnector for FakeVault {
    type Transport = FakeVault;

    fn connect(&self, _config: &VaultConfig) -> Result<FakeVault, VaultError> {
        Ok(Self {
            state: Arc::clone(&self.state),
            token: None,
        })
    }
}

#[async_trait]
impl VaultTransport for FakeVault {
    async fn read(&self, path: &str) -> Result<Option<LogicalResponse>, VaultError> {
        let body = {
            let mut state = self.lock();
            state.read_log.push((path.to_string(), self.token.clone()));
            state.reads.get(path).cloned()
        };
        body.map(|body| {
            serde_json::from_value(body).map_err(|source| VaultError::Decode {
                path: path.to_string(),
                source,
            })
        })
        .transpose()
    }

    async fn write(&self, path: &str, _body: Value) -> Result<Option<LogicalResponse>, VaultError> {
        let mut state = self.lock();
        state.login_log.push(path.to_string());
        match state.logins.get(path) {
            Some(token) => serde_json::from_value(serde_json::json!({
                "auth": { "client_token": token }
            }))
            .map(Some)
            .map_err(|source| VaultError::Decode {
                path: path.to_string(),
                source,
            }),
            None => Err(VaultError::Http {
                path: path.to_string(),
                status: 400,
                message: "invalid credentials".to_string(),
            }),
        }
    }

    fn with_token(&self, token: &str) -> Self {
        Self {
            state: Arc::clone(&self.state),
            token: Some(token.to_string()),
        }
    }
}

//! # Object Store
//!
//! Kubernetes API access needed by the reconciler, behind a trait so the
//! control loop can run against an in-memory store in tests.
//!
//! `KubeStore` is the production implementation. It also serves service
//! account tokens for Vault's Kubernetes auth method.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};
use serde_json::json;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::constants::{FIELD_MANAGER, SERVICE_ACCOUNT_TOKEN_FIELD};
use crate::crd::{VaultSecret, VaultSecretStatus};
use crate::provider::vault::TokenSource;
use crate::provider::AuthError;

/// Kubernetes API failure, classified for the control loop
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict writing {resource}: {message}")]
    Conflict { resource: String, message: String },

    #[error("{resource} is invalid: {message}")]
    Invalid { resource: String, message: String },

    #[error("Kubernetes API request for {resource} failed: {source}")]
    Api {
        resource: String,
        #[source]
        source: kube::Error,
    },
}

impl StoreError {
    /// Classify a kube error raised while accessing `resource`
    pub fn from_kube(resource: impl Into<String>, error: kube::Error) -> Self {
        let resource = resource.into();
        match error {
            kube::Error::Api(api_err) if api_err.code == 404 => Self::NotFound(resource),
            kube::Error::Api(api_err) if api_err.code == 409 => Self::Conflict {
                resource,
                message: api_err.message,
            },
            kube::Error::Api(api_err) if api_err.code == 422 || api_err.reason == "Invalid" => {
                Self::Invalid {
                    resource,
                    message: api_err.message,
                }
            }
            source => Self::Api { resource, source },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

/// Objects read and written by the reconciler
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_vault_secret(&self, namespace: &str, name: &str)
        -> Result<VaultSecret, StoreError>;

    /// `Ok(None)` when the Secret does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError>;

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, StoreError>;

    /// Replace a Secret, guarded by its `resourceVersion`
    async fn replace_secret(&self, namespace: &str, secret: &Secret)
        -> Result<Secret, StoreError>;

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: &VaultSecretStatus,
    ) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_vault_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<VaultSecret, StoreError> {
        let api: Api<VaultSecret> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| StoreError::from_kube(format!("VaultSecret {namespace}/{name}"), e))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        match self.secrets(namespace).get(name).await {
            Ok(secret) => Ok(Some(secret)),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Ok(None),
            Err(e) => Err(StoreError::from_kube(format!("Secret {namespace}/{name}"), e)),
        }
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, StoreError> {
        let name = secret.metadata.name.as_deref().unwrap_or_default();
        self.secrets(namespace)
            .create(&post_params(), secret)
            .await
            .map_err(|e| StoreError::from_kube(format!("Secret {namespace}/{name}"), e))
    }

    async fn replace_secret(
        &self,
        namespace: &str,
        secret: &Secret,
    ) -> Result<Secret, StoreError> {
        let name = secret.metadata.name.as_deref().unwrap_or_default();
        self.secrets(namespace)
            .replace(name, &post_params(), secret)
            .await
            .map_err(|e| StoreError::from_kube(format!("Secret {namespace}/{name}"), e))
    }

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: &VaultSecretStatus,
    ) -> Result<(), StoreError> {
        let api: Api<VaultSecret> = Api::namespaced(self.client.clone(), namespace);
        let patch = json!({ "status": status });
        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PatchParams::default()
        };
        api.patch_status(name, &params, &Patch::Merge(&patch))
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(format!("VaultSecret {namespace}/{name}"), e))
    }
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..PostParams::default()
    }
}

#[async_trait]
impl TokenSource for KubeStore {
    async fn service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> Result<Zeroizing<String>, AuthError> {
        let failure = |reason: String| AuthError::ServiceAccount {
            namespace: namespace.to_string(),
            service_account: service_account.to_string(),
            reason,
        };

        let accounts: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        let account = accounts
            .get(service_account)
            .await
            .map_err(|e| failure(e.to_string()))?;

        let secret_name = account
            .secrets
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find_map(|reference| reference.name.clone())
            .ok_or_else(|| failure("no secret associated with the service account".to_string()))?;

        let secret = self
            .secrets(namespace)
            .get(&secret_name)
            .await
            .map_err(|e| failure(format!("unable to read secret {secret_name}: {e}")))?;

        // A missing field yields an empty token, rejected before login
        let token = secret
            .data
            .as_ref()
            .and_then(|data| data.get(SERVICE_ACCOUNT_TOKEN_FIELD))
            .map(|bytes| String::from_utf8_lossy(&bytes.0).into_owned())
            .unwrap_or_default();
        Ok(Zeroizing::new(token))
    }
}

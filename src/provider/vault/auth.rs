//! # Vault Authentication
//!
//! Selects one authentication method from a `VaultAuth` descriptor and
//! exchanges its credentials for a Vault session token.
//!
//! Precedence, first match wins:
//! 1. non-empty `token`
//! 2. `approle` with a non-empty role id (mount defaults to `approle`)
//! 3. `kubernetes` with a non-empty role (service account defaults to `default`,
//!    its namespace to the VaultSecret's namespace)

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info_span, Instrument};
use zeroize::Zeroizing;

use crate::constants::{DEFAULT_APPROLE_MOUNT, DEFAULT_SERVICE_ACCOUNT};
use crate::crd::VaultAuth;
use crate::provider::vault::errors::AuthError;
use crate::provider::VaultTransport;

/// Mount used when the Kubernetes auth method does not name one
const DEFAULT_KUBERNETES_MOUNT: &str = "kubernetes";

/// Source of service account bearer tokens for Kubernetes auth
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// JWT of `service_account` in `namespace`
    async fn service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> Result<Zeroizing<String>, AuthError>;
}

/// A selected authentication method with its credentials
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Token {
        token: Zeroizing<String>,
    },
    AppRole {
        mount: String,
        role_id: String,
        secret_id: Zeroizing<String>,
    },
    Kubernetes {
        mount: String,
        role: String,
        service_account: String,
        service_account_namespace: String,
    },
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token { .. } => f.debug_struct("Token").finish_non_exhaustive(),
            Self::AppRole { mount, role_id, .. } => f
                .debug_struct("AppRole")
                .field("mount", mount)
                .field("role_id", role_id)
                .finish_non_exhaustive(),
            Self::Kubernetes {
                mount,
                role,
                service_account,
                service_account_namespace,
            } => f
                .debug_struct("Kubernetes")
                .field("mount", mount)
                .field("role", role)
                .field("service_account", service_account)
                .field("service_account_namespace", service_account_namespace)
                .finish(),
        }
    }
}

/// Pick the authentication method for a VaultSecret living in `resource_namespace`
pub fn select_auth_method(
    auth: &VaultAuth,
    resource_namespace: &str,
) -> Result<AuthMethod, AuthError> {
    if let Some(token) = auth.token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(AuthMethod::Token {
            token: Zeroizing::new(token.to_string()),
        });
    }

    if let Some(approle) = auth.approle.as_ref().filter(|a| !a.role_id.is_empty()) {
        return Ok(AuthMethod::AppRole {
            mount: non_empty_or(approle.name.as_deref(), DEFAULT_APPROLE_MOUNT),
            role_id: approle.role_id.clone(),
            secret_id: Zeroizing::new(approle.secret_id.clone()),
        });
    }

    if let Some(kubernetes) = auth.kubernetes.as_ref().filter(|k| !k.role.is_empty()) {
        return Ok(AuthMethod::Kubernetes {
            mount: non_empty_or(Some(kubernetes.cluster.as_str()), DEFAULT_KUBERNETES_MOUNT),
            role: kubernetes.role.clone(),
            service_account: non_empty_or(
                kubernetes.service_account.as_deref(),
                DEFAULT_SERVICE_ACCOUNT,
            ),
            service_account_namespace: non_empty_or(
                kubernetes.service_account_namespace.as_deref(),
                resource_namespace,
            ),
        });
    }

    Err(AuthError::NoMethodConfigured)
}

fn non_empty_or(value: Option<&str>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

impl AuthMethod {
    /// Short name used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::AppRole { .. } => "approle",
            Self::Kubernetes { .. } => "kubernetes",
        }
    }

    /// Authenticate `transport`, returning a copy carrying the session token
    pub async fn login<T, S>(&self, transport: &T, tokens: &S) -> Result<T, AuthError>
    where
        T: VaultTransport,
        S: TokenSource + ?Sized,
    {
        match self {
            Self::Token { token } => Ok(transport.with_token(token)),
            Self::AppRole {
                mount,
                role_id,
                secret_id,
            } => {
                let body = json!({ "role_id": role_id, "secret_id": secret_id.as_str() });
                let token = exchange(transport, mount, body)
                    .instrument(info_span!("vault.auth.approle", vault.auth.mount = %mount))
                    .await?;
                Ok(transport.with_token(&token))
            }
            Self::Kubernetes {
                mount,
                role,
                service_account,
                service_account_namespace,
            } => {
                let jwt = tokens
                    .service_account_token(service_account_namespace, service_account)
                    .await?;
                if jwt.trim().is_empty() {
                    return Err(AuthError::EmptyJwt);
                }
                let body = json!({ "role": role, "jwt": jwt.as_str() });
                let token = exchange(transport, mount, body)
                    .instrument(info_span!(
                        "vault.auth.kubernetes",
                        vault.auth.mount = %mount,
                        vault.auth.role = %role
                    ))
                    .await?;
                Ok(transport.with_token(&token))
            }
        }
    }
}

/// POST credentials to `auth/{mount}/login` and extract the client token
async fn exchange<T: VaultTransport>(
    transport: &T,
    mount: &str,
    body: serde_json::Value,
) -> Result<Zeroizing<String>, AuthError> {
    let response = transport
        .write(&format!("auth/{mount}/login"), body)
        .await
        .map_err(|source| AuthError::Login {
            mount: mount.to_string(),
            source,
        })?;

    let token = response
        .and_then(|r| r.auth)
        .map(|auth| Zeroizing::new(auth.client_token))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::MissingClientToken {
            mount: mount.to_string(),
        })?;

    debug!(vault.auth.mount = mount, "vault.auth.login.success");
    Ok(token)
}

//! # Vault HTTP Client
//!
//! `VaultTransport` implementation over the Vault HTTP API using reqwest.
//!
//! Requests go to `{addr}/v1/{path}` with:
//! - `X-Vault-Token` once a session token is attached
//! - `X-Vault-Namespace` when the connection names a Vault Enterprise namespace
//!
//! Vault answers `404` with a JSON body for paths that do not exist, and also
//! for version 1 paths read on a version 2 mount (with a warning). Both are
//! returned as responses, never as errors, so the reader can tell them apart.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, debug_span, Instrument};
use zeroize::Zeroizing;

use crate::crd::VaultConfig;
use crate::observability::metrics;
use crate::provider::vault::errors::VaultError;
use crate::provider::vault::responses::{ErrorResponse, LogicalResponse};
use crate::provider::{VaultConnector, VaultTransport};

/// Vault HTTP client bound to one server and, optionally, one session token
#[derive(Clone)]
pub struct HttpVaultClient {
    http_client: reqwest::Client,
    base_url: String,
    namespace: Option<String>,
    token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for HttpVaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpVaultClient")
            .field("base_url", &self.base_url)
            .field("namespace", &self.namespace)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpVaultClient {
    /// Create an unauthenticated client for `config`
    pub fn new(config: &VaultConfig, timeout: Duration) -> Result<Self, VaultError> {
        let addr = config.addr.trim();
        if addr.is_empty() {
            return Err(VaultError::Config("Vault address is empty".to_string()));
        }
        if !(addr.starts_with("http://") || addr.starts_with("https://")) {
            return Err(VaultError::Config(format!(
                "Vault address '{addr}' must start with http:// or https://"
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(|e| VaultError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: addr.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone().filter(|ns| !ns.is_empty()),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .http_client
            .request(method, self.url(path))
            .header("X-Vault-Request", "true");
        if let Some(token) = &self.token {
            request = request.header("X-Vault-Token", token.as_str());
        }
        if let Some(namespace) = &self.namespace {
            request = request.header("X-Vault-Namespace", namespace);
        }
        request
    }

    async fn send(
        &self,
        request: RequestBuilder,
        operation: &'static str,
        path: &str,
    ) -> Result<Option<LogicalResponse>, VaultError> {
        let start = std::time::Instant::now();
        let result = self.execute(request, path).await;
        let outcome = match &result {
            Ok(Some(_)) => "success",
            Ok(None) => "empty",
            Err(_) => "error",
        };
        metrics::observe_vault_request(operation, outcome, start.elapsed().as_secs_f64());
        result
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<Option<LogicalResponse>, VaultError> {
        let response = request.send().await.map_err(|source| VaultError::Transport {
            path: path.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|source| VaultError::Transport {
            path: path.to_string(),
            source,
        })?;

        debug!(vault.path = path, http.status = status.as_u16(), "vault.response");

        match status {
            StatusCode::NO_CONTENT => Ok(None),
            s if s.is_success() => {
                if body.trim().is_empty() {
                    return Ok(None);
                }
                serde_json::from_str::<LogicalResponse>(&body)
                    .map(Some)
                    .map_err(|source| VaultError::Decode {
                        path: path.to_string(),
                        source,
                    })
            }
            StatusCode::NOT_FOUND => {
                let parsed = serde_json::from_str::<LogicalResponse>(&body).unwrap_or_default();
                Ok((!parsed.is_empty()).then_some(parsed))
            }
            s => Err(VaultError::Http {
                path: path.to_string(),
                status: s.as_u16(),
                message: error_message(&body),
            }),
        }
    }
}

/// Join Vault's `errors` array, falling back to the raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ => body.trim().to_string(),
    }
}

#[async_trait]
impl VaultTransport for HttpVaultClient {
    async fn read(&self, path: &str) -> Result<Option<LogicalResponse>, VaultError> {
        let span = debug_span!("vault.logical.read", vault.path = path);
        self.send(self.request(Method::GET, path), "read", path)
            .instrument(span)
            .await
    }

    async fn write(&self, path: &str, body: Value) -> Result<Option<LogicalResponse>, VaultError> {
        let span = debug_span!("vault.logical.write", vault.path = path);
        self.send(self.request(Method::POST, path).json(&body), "write", path)
            .instrument(span)
            .await
    }

    fn with_token(&self, token: &str) -> Self {
        Self {
            token: Some(Zeroizing::new(token.to_string())),
            ..self.clone()
        }
    }
}

/// Production connector building `HttpVaultClient`s
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl VaultConnector for HttpConnector {
    type Transport = HttpVaultClient;

    fn connect(&self, config: &VaultConfig) -> Result<HttpVaultClient, VaultError> {
        HttpVaultClient::new(config, self.timeout)
    }
}

//! In-memory Vault doubles for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use serde_json::Value;
use zeroize::Zeroizing;

use crate::provider::vault::auth::TokenSource;
use crate::provider::vault::errors::{AuthError, VaultError};
use crate::provider::vault::responses::LogicalResponse;
use crate::provider::VaultTransport;

static RUSTLS_INIT: Once = Once::new();

pub(crate) fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // Another test binary thread may have installed it already
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

#[derive(Debug, Clone)]
enum Reply {
    Body(Value),
    Error(u16, String),
}

#[derive(Debug, Default)]
struct State {
    reads: HashMap<String, Reply>,
    writes: HashMap<String, Reply>,
    read_log: Vec<String>,
    write_log: Vec<(String, Value)>,
}

/// Transport answering from canned replies; unknown paths read as empty
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTransport {
    state: Arc<Mutex<State>>,
    token: Option<String>,
}

impl FakeTransport {
    pub(crate) fn on_read(self, path: &str, body: Value) -> Self {
        self.lock().reads.insert(path.to_string(), Reply::Body(body));
        self
    }

    pub(crate) fn on_read_error(self, path: &str, status: u16, message: &str) -> Self {
        self.lock()
            .reads
            .insert(path.to_string(), Reply::Error(status, message.to_string()));
        self
    }

    pub(crate) fn on_write(self, path: &str, body: Value) -> Self {
        self.lock().writes.insert(path.to_string(), Reply::Body(body));
        self
    }

    pub(crate) fn read_count(&self, path: &str) -> usize {
        self.lock().read_log.iter().filter(|p| *p == path).count()
    }

    pub(crate) fn writes(&self) -> Vec<(String, Value)> {
        self.lock().write_log.clone()
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.token.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake transport lock poisoned")
    }

    fn answer(path: &str, reply: Option<Reply>) -> Result<Option<LogicalResponse>, VaultError> {
        match reply {
            None => Ok(None),
            Some(Reply::Body(body)) => serde_json::from_value(body)
                .map(Some)
                .map_err(|source| VaultError::Decode {
                    path: path.to_string(),
                    source,
                }),
            Some(Reply::Error(status, message)) => Err(VaultError::Http {
                path: path.to_string(),
                status,
                message,
            }),
        }
    }
}

#[async_trait]
impl VaultTransport for FakeTransport {
    async fn read(&self, path: &str) -> Result<Option<LogicalResponse>, VaultError> {
        let reply = {
            let mut state = self.lock();
            state.read_log.push(path.to_string());
            state.reads.get(path).cloned()
        };
        Self::answer(path, reply)
    }

    async fn write(&self, path: &str, body: Value) -> Result<Option<LogicalResponse>, VaultError> {
        let reply = {
            let mut state = self.lock();
            state.write_log.push((path.to_string(), body));
            state.writes.get(path).cloned()
        };
        Self::answer(path, reply)
    }

    fn with_token(&self, token: &str) -> Self {
        Self {
            state: Arc::clone(&self.state),
            token: Some(token.to_string()),
        }
    }
}

/// Service account tokens keyed by `namespace/name`
#[derive(Debug, Default)]
pub(crate) struct FakeTokens {
    tokens: HashMap<String, String>,
}

impl FakeTokens {
    pub(crate) fn with_token(mut self, namespace: &str, name: &str, jwt: &str) -> Self {
        self.tokens.insert(format!("{namespace}/{name}"), jwt.to_string());
        self
    }
}

#[async_trait]
impl TokenSource for FakeTokens {
    async fn service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> Result<Zeroizing<String>, AuthError> {
        self.tokens
            .get(&format!("{namespace}/{service_account}"))
            .map(|jwt| Zeroizing::new(jwt.clone()))
            .ok_or_else(|| AuthError::ServiceAccount {
                namespace: namespace.to_string(),
                service_account: service_account.to_string(),
                reason: "not found".to_string(),
            })
    }
}

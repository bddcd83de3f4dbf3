//! # Reconciler Types
//!
//! Shared context handed to every reconcile pass and the error it can fail with.

use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use thiserror::Error;

use crate::config::ControllerConfig;
use crate::controller::backoff::ExponentialBackoff;
use crate::controller::filter::LabelFilter;
use crate::controller::rate_gate::UpdateRateGate;
use crate::controller::reconciler::store::{KubeStore, StoreError};
use crate::provider::vault::HttpConnector;
use crate::provider::AuthError;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to fetch {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Vault authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("failed to write Secret {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to update status of {key}: {source}")]
    Status {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("invalid VaultSecret {key}: {reason}")]
    InvalidSpec { key: String, reason: String },

    #[error("{failed} of {total} secret entries could not be resolved")]
    PartialSync { failed: usize, total: usize },
}

/// Context shared by all reconcile passes
///
/// Generic over the object store and the Vault connector so the control loop
/// can be driven by in-memory fakes.
pub struct Reconciler<S = KubeStore, C = HttpConnector> {
    pub(crate) store: S,
    pub(crate) connector: C,
    pub(crate) rate_gate: Arc<UpdateRateGate>,
    pub(crate) label_filter: LabelFilter,
    pub(crate) operator_name: String,
    pub(crate) backoff: ExponentialBackoff,
    pub(crate) default_sync_period: Duration,
    pub(crate) error_requeue: Duration,
}

impl<S, C> std::fmt::Debug for Reconciler<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("label_filter", &self.label_filter)
            .field("operator_name", &self.operator_name)
            .field("backoff", &self.backoff)
            .field("default_sync_period", &self.default_sync_period)
            .field("error_requeue", &self.error_requeue)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Production reconciler backed by the cluster and Vault over HTTP
    pub fn new(client: Client, config: &ControllerConfig, label_filter: LabelFilter) -> Self {
        Self::with_parts(
            KubeStore::new(client),
            HttpConnector::new(config.vault_http_timeout()),
            Arc::new(UpdateRateGate::new(config.min_secret_update_interval())),
            label_filter,
            config,
        )
    }
}

impl<S, C> Reconciler<S, C> {
    pub fn with_parts(
        store: S,
        connector: C,
        rate_gate: Arc<UpdateRateGate>,
        label_filter: LabelFilter,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            store,
            connector,
            rate_gate,
            label_filter,
            operator_name: config.operator_name.clone(),
            backoff: ExponentialBackoff::from_config(config),
            default_sync_period: config.default_sync_period(),
            error_requeue: config.reconciliation_error_requeue_duration(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rate_gate(&self) -> &Arc<UpdateRateGate> {
        &self.rate_gate
    }

    pub fn label_filter(&self) -> &LabelFilter {
        &self.label_filter
    }

    /// Fixed delay before a failed pass is retried
    pub fn error_requeue(&self) -> Duration {
        self.error_requeue
    }
}

//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use vault_secret_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Vault seams
pub use crate::provider::vault::{AuthMethod, HttpConnector, KvVersion, TokenSource};
pub use crate::provider::{AuthError, VaultConnector, VaultError, VaultTransport};

// Reconciler types
pub use crate::controller::reconciler::{
    reconcile, KubeStore, ObjectStore, Reconciler, ReconcilerError, StoreError,
};

// Supporting components
pub use crate::controller::backoff::{retry_on_conflict, ExponentialBackoff};
pub use crate::controller::filter::LabelFilter;
pub use crate::controller::rate_gate::UpdateRateGate;
pub use crate::runtime::error_policy;

// Config types
pub use crate::config::{ControllerConfig, ServerConfig, WatchScope};

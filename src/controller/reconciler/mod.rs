//! # Reconciler
//!
//! Core reconciliation logic for `VaultSecret` resources.
//!
//! The reconciler:
//! - Fetches the `VaultSecret` and applies the label filter
//! - Enforces a minimum interval between writes of the same Secret
//! - Authenticates to Vault and resolves every entry through a per-pass cache
//! - Converges the target Secret with conflict retries
//! - Records one status entry per secret entry
//!
//! ## Module Structure
//!
//! - `reconcile.rs` - the control loop of one pass
//! - `resolve.rs` - authentication and entry resolution
//! - `converge.rs` - desired Secret and create-or-update
//! - `status.rs` - status change detection
//! - `store.rs` - Kubernetes API access
//! - `duration.rs` - `syncPeriod` parsing
//! - `types.rs` - shared context and errors

pub mod converge;
pub mod duration;
pub mod reconcile;
pub mod resolve;
pub mod status;
pub mod store;
pub mod types;

pub use converge::{converge_secret, DesiredSecret, WriteOperation};
pub use reconcile::reconcile;
pub use resolve::{open_session, resolve_entries, Resolution};
pub use store::{KubeStore, ObjectStore, StoreError};
pub use types::{Reconciler, ReconcilerError};

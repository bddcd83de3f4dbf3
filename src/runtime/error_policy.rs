//! # Error Policy
//!
//! Requeue decision for failed reconcile passes.

use std::sync::Arc;

use kube::ResourceExt;
use kube_runtime::controller::Action;
use tracing::{error, warn};

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::VaultSecret;
use crate::observability;

/// Requeue a failed pass after the configured fixed delay
pub fn error_policy<S, C>(
    obj: Arc<VaultSecret>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler<S, C>>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = %name,
        resource.namespace = %namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    match error {
        // Failed entries are already visible in the status
        ReconcilerError::PartialSync { .. } => warn!("Reconciliation incomplete: {}", error),
        _ => error!("Reconciliation error for {}/{}: {:?}", namespace, name, error),
    }
    observability::metrics::increment_reconciliation_errors();

    Action::requeue(ctx.error_requeue())
}

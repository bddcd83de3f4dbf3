//! # Reconciliation Logic
//!
//! One pass over a VaultSecret:
//!
//! 1. Fetch the resource; a deleted resource ends the pass
//! 2. Check the label filter and the update-rate gate
//! 3. Change the Secret type on its own when it differs
//! 4. Authenticate, resolve every entry, create or update the Secret
//! 5. Write the status when it changed
//! 6. Requeue at the sync period, or not at all when it is zero
//!
//! Errors are handled by the error policy of the watch loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::controller::rate_gate::UpdateRateGate;
use crate::controller::reconciler::converge::{
    create_or_update, transition_type, DesiredSecret, WriteOperation,
};
use crate::controller::reconciler::duration::parse_duration;
use crate::controller::reconciler::resolve::{open_session, resolve_entries};
use crate::controller::reconciler::status::status_changed;
use crate::controller::reconciler::store::ObjectStore;
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::{VaultSecret, VaultSecretStatus};
use crate::observability::metrics;
use crate::provider::vault::TokenSource;
use crate::provider::VaultConnector;

pub async fn reconcile<S, C>(
    vault_secret: Arc<VaultSecret>,
    ctx: Arc<Reconciler<S, C>>,
) -> Result<Action, ReconcilerError>
where
    S: ObjectStore + TokenSource + 'static,
    C: VaultConnector + 'static,
{
    let start = Instant::now();
    let name = vault_secret.name_any();
    let namespace = vault_secret.namespace().unwrap_or_default();

    metrics::increment_reconciliations();
    let span = info_span!(
        "reconcile",
        resource.name = %name,
        resource.namespace = %namespace,
        resource.kind = "VaultSecret"
    );
    let result = reconcile_resource(&ctx, &namespace, &name)
        .instrument(span)
        .await;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    result
}

async fn reconcile_resource<S, C>(
    ctx: &Reconciler<S, C>,
    namespace: &str,
    name: &str,
) -> Result<Action, ReconcilerError>
where
    S: ObjectStore + TokenSource,
    C: VaultConnector,
{
    let key = format!("{namespace}/{name}");

    let vault_secret = match ctx.store.get_vault_secret(namespace, name).await {
        Ok(vault_secret) => vault_secret,
        Err(e) if e.is_not_found() => {
            info!("VaultSecret resource not found. Ignoring since object must be deleted");
            return Ok(Action::await_change());
        }
        Err(source) => return Err(ReconcilerError::Fetch { key, source }),
    };

    if !ctx.label_filter.admits(vault_secret.labels()) {
        debug!("VaultSecret does not match the label filter, ignoring");
        return Ok(Action::await_change());
    }

    let sync_period = match sync_period(&vault_secret, ctx.default_sync_period) {
        Ok(period) => period,
        Err(e) => {
            error!(error = %e, "Not reconciling until the VaultSecret is fixed");
            return Ok(Action::await_change());
        }
    };

    let desired = DesiredSecret::from_vault_secret(
        &vault_secret,
        &ctx.operator_name,
        &ctx.label_filter,
        Utc::now(),
    );
    let gate_key = UpdateRateGate::key(namespace, &desired.name);
    if !ctx.rate_gate.try_enter(&gate_key) {
        debug!(secret.name = %desired.name, "Secret updated too recently, skipping");
        metrics::increment_rate_limited();
        return Ok(resync(sync_period));
    }

    match transition_type(&ctx.store, &ctx.backoff, &desired).await {
        Ok(false) => {}
        Ok(true) => {
            info!(
                secret.name = %desired.name,
                secret_type = %desired.secret_type,
                "Secret type changed, data follows on the next pass"
            );
            metrics::increment_secret_writes("type_changed");
            return Ok(resync(sync_period));
        }
        Err(e) if e.is_invalid() => {
            error!(secret.name = %desired.name, error = %e, "Failed to change Secret type");
            return Ok(Action::await_change());
        }
        Err(source) => {
            return Err(ReconcilerError::Write {
                key: format!("{namespace}/{}", desired.name),
                source,
            })
        }
    }

    let session = match open_session(&ctx.connector, &ctx.store, &vault_secret).await {
        Ok(session) => session,
        Err(e) if e.is_fatal() => {
            error!(error = %e, "Unable to authenticate to Vault");
            return Ok(Action::await_change());
        }
        Err(e) => return Err(e.into()),
    };

    let resolution = resolve_entries(&session, &vault_secret.spec.secrets).await;

    // The partially resolved Secret is written before failures are reported
    let written = create_or_update(&ctx.store, &ctx.backoff, &desired, &resolution.values).await;

    if status_changed(vault_secret.status.as_ref(), &resolution.entries) {
        let status = VaultSecretStatus {
            entries: resolution.entries.clone(),
        };
        if let Err(source) = ctx.store.update_status(namespace, name, &status).await {
            error!(error = %source, "Failed to update VaultSecret status");
            return Err(ReconcilerError::Status { key, source });
        }
        metrics::increment_status_updates();
    }

    match written {
        Ok(operation) => {
            match operation {
                WriteOperation::Created => info!(secret.name = %desired.name, "Secret created"),
                WriteOperation::Updated => info!(secret.name = %desired.name, "Secret updated"),
                WriteOperation::Unchanged => debug!(secret.name = %desired.name, "Secret unchanged"),
            }
            metrics::increment_secret_writes(operation.as_str());
            ctx.rate_gate.record_update(&gate_key);
        }
        Err(e) if e.is_invalid() => {
            error!(secret.name = %desired.name, error = %e, "Failed to update Secret");
            return Ok(Action::await_change());
        }
        Err(source) => {
            return Err(ReconcilerError::Write {
                key: format!("{namespace}/{}", desired.name),
                source,
            })
        }
    }

    let failed = resolution.failed();
    if failed > 0 {
        warn!(
            failed,
            "Some errors occurred while reading secrets, see VaultSecret status for details"
        );
        metrics::increment_entry_failures(failed);
        return Err(ReconcilerError::PartialSync {
            failed,
            total: resolution.entries.len(),
        });
    }

    Ok(resync(sync_period))
}

/// Resync period of `vault_secret`, `default` when unset
fn sync_period(vault_secret: &VaultSecret, default: Duration) -> Result<Duration, ReconcilerError> {
    match vault_secret
        .spec
        .sync_period
        .as_deref()
        .filter(|period| !period.trim().is_empty())
    {
        None => Ok(default),
        Some(period) => parse_duration(period).map_err(|e| ReconcilerError::InvalidSpec {
            key: format!(
                "{}/{}",
                vault_secret.namespace().unwrap_or_default(),
                vault_secret.name_any()
            ),
            reason: format!("syncPeriod: {e}"),
        }),
    }
}

/// Requeue at the sync period; a zero period disables periodic resync
fn resync(sync_period: Duration) -> Action {
    if sync_period.is_zero() {
        Action::await_change()
    } else {
        Action::requeue(sync_period)
    }
}

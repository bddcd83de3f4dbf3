//! # Watch Loop
//!
//! Runs one kube-runtime `Controller` per watched namespace, or a single
//! cluster-wide one. Each controller watches VaultSecrets through the label
//! selector of the filter and the Secrets they own.
//!
//! Controllers stop on SIGINT or SIGTERM. A controller stream that ends
//! without a shutdown signal is restarted after the configured delay.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use kube_runtime::{watcher, Controller};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{ControllerConfig, WatchScope};
use crate::controller::reconciler::{reconcile, KubeStore, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::VaultSecret;
use crate::provider::vault::HttpConnector;
use crate::runtime::error_policy::error_policy;

/// Run the controllers until SIGINT or SIGTERM
pub async fn run_controller(
    client: Client,
    reconciler: Arc<Reconciler>,
    controller_config: &ControllerConfig,
    server_state: Arc<ServerState>,
) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received, stopping controllers");
        signal_state.set_ready(false);
        let _ = shutdown_tx.send(true);
    });

    let scopes: Vec<Option<String>> = match &controller_config.watch_scope {
        WatchScope::Cluster => vec![None],
        WatchScope::Namespaces(namespaces) => namespaces.iter().cloned().map(Some).collect(),
    };

    let controllers = scopes.into_iter().map(|namespace| {
        run_scope(
            client.clone(),
            namespace,
            Arc::clone(&reconciler),
            controller_config,
            shutdown_rx.clone(),
        )
    });
    join_all(controllers).await;

    info!("Controller stopped");
    Ok(())
}

async fn run_scope(
    client: Client,
    namespace: Option<String>,
    reconciler: Arc<Reconciler>,
    controller_config: &ControllerConfig,
    shutdown: watch::Receiver<bool>,
) {
    let scope = namespace.as_deref().unwrap_or("*").to_string();

    let mut watcher_config = watcher::Config::default().any_semantic();
    if let Some(selector) = reconciler.label_filter().selector() {
        watcher_config = watcher_config.labels(&selector);
    }

    loop {
        let (vault_secrets, secrets): (Api<VaultSecret>, Api<Secret>) = match &namespace {
            Some(ns) => (
                Api::namespaced(client.clone(), ns),
                Api::namespaced(client.clone(), ns),
            ),
            None => (Api::all(client.clone()), Api::all(client.clone())),
        };

        info!(watch.scope = %scope, "Starting VaultSecret controller");
        Controller::new(vault_secrets, watcher_config.clone())
            .owns(secrets, watcher_config.clone())
            .shutdown_on_signal()
            .run(
                reconcile::<KubeStore, HttpConnector>,
                error_policy::<KubeStore, HttpConnector>,
                Arc::clone(&reconciler),
            )
            .for_each(|result| {
                match result {
                    Ok((object, _)) => debug!(
                        resource.name = %object.name,
                        resource.namespace = object.namespace.as_deref().unwrap_or_default(),
                        "Reconciled"
                    ),
                    Err(e) => warn!(watch.scope = %scope, "Controller error: {}", e),
                }
                std::future::ready(())
            })
            .await;

        if *shutdown.borrow() {
            break;
        }

        warn!(
            watch.scope = %scope,
            "Watch stream ended, restarting in {}s unless shutting down",
            controller_config.watch_restart_delay_secs
        );
        let mut stop = shutdown.clone();
        let delay = controller_config.watch_restart_delay_duration();
        if tokio::time::timeout(delay, stop.wait_for(|requested| *requested))
            .await
            .is_ok()
        {
            break;
        }
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!("Unable to listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

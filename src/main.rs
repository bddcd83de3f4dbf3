//! # VaultSecret Controller
//!
//! A Kubernetes controller that materializes HashiCorp Vault KV secrets into
//! Kubernetes Secrets.
//!
//! ## Overview
//!
//! For every `VaultSecret` resource the controller:
//!
//! 1. **Authenticates to Vault** - Token, AppRole or Kubernetes service account
//! 2. **Reads KV entries** - KV version 1 and 2, detected automatically when not set
//! 3. **Writes a Secret** - Creates or updates the target Secret, owned by the `VaultSecret`
//! 4. **Reports per-entry status** - One status entry per secret entry
//! 5. **Resyncs periodically** - Every `syncPeriod`
//!
//! ## Features
//!
//! - **Label filtering**: `--filter-label key=value` restricts the watched resources
//! - **Namespace scoping**: `WATCH_NAMESPACE` / `WATCH_MULTINAMESPACES`
//! - **Prometheus metrics**: Exposes metrics for monitoring and observability
//! - **Health probes**: HTTP endpoints for liveness and readiness checks

use anyhow::Result;
use clap::Parser;

use vault_secret_controller::runtime::{initialize, run_controller};

#[derive(Parser, Debug)]
#[command(name = "vault-secret-controller", version, about)]
struct Args {
    /// Only reconcile VaultSecrets carrying this label (key=value, repeatable)
    #[arg(long = "filter-label", value_name = "KEY=VALUE")]
    filter_labels: Vec<String>,

    /// Port of the metrics and probe server (overrides METRICS_PORT)
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let init_result = initialize(&args.filter_labels, args.metrics_port).await?;

    run_controller(
        init_result.client,
        init_result.reconciler,
        &init_result.controller_config,
        init_result.server_state,
    )
    .await
}

//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `vault_secret_reconciliations_total` - Total number of reconciliations
//! - `vault_secret_reconciliation_errors_total` - Total number of reconciliation errors
//! - `vault_secret_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `vault_secret_rate_limited_total` - Reconciliations skipped by the update-rate gate
//! - `vault_secret_secret_writes_total` - Writes of materialized Secrets by operation
//! - `vault_secret_status_updates_total` - VaultSecret status writes
//! - `vault_secret_entry_failures_total` - Secret entries that could not be resolved
//! - `vault_secret_vault_requests_total` - Vault HTTP requests by operation and outcome
//! - `vault_secret_vault_request_duration_seconds` - Duration of Vault HTTP requests
//! - `vault_secret_vault_cache_hits_total` - Reads served by the per-reconcile cache
//! - `vault_secret_vault_logins_total` - Vault logins by auth method

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_secret_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_secret_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "vault_secret_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static RATE_LIMITED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_secret_rate_limited_total",
        "Total number of reconciliations skipped because the Secret was updated too recently",
    )
    .expect("Failed to create RATE_LIMITED_TOTAL metric - this should never happen")
});

static SECRET_WRITES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_secret_secret_writes_total",
            "Total number of materialized Secret writes by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create SECRET_WRITES_TOTAL metric - this should never happen")
});

static STATUS_UPDATES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_secret_status_updates_total",
        "Total number of VaultSecret status updates",
    )
    .expect("Failed to create STATUS_UPDATES_TOTAL metric - this should never happen")
});

static ENTRY_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_secret_entry_failures_total",
        "Total number of secret entries that could not be resolved from Vault",
    )
    .expect("Failed to create ENTRY_FAILURES_TOTAL metric - this should never happen")
});

static VAULT_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_secret_vault_requests_total",
            "Total number of Vault HTTP requests by operation and outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create VAULT_REQUESTS_TOTAL metric - this should never happen")
});

static VAULT_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "vault_secret_vault_request_duration_seconds",
            "Duration of Vault HTTP requests in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["operation"],
    )
    .expect("Failed to create VAULT_REQUEST_DURATION metric - this should never happen")
});

static VAULT_CACHE_HITS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_secret_vault_cache_hits_total",
        "Total number of Vault reads served from the per-reconcile cache",
    )
    .expect("Failed to create VAULT_CACHE_HITS_TOTAL metric - this should never happen")
});

static VAULT_LOGINS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_secret_vault_logins_total",
            "Total number of Vault logins by auth method and outcome",
        ),
        &["method", "outcome"],
    )
    .expect("Failed to create VAULT_LOGINS_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(RATE_LIMITED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRET_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_UPDATES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ENTRY_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_REQUEST_DURATION.clone()))?;
    REGISTRY.register(Box::new(VAULT_CACHE_HITS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_LOGINS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_rate_limited() {
    RATE_LIMITED_TOTAL.inc();
}

pub fn increment_secret_writes(operation: &str) {
    SECRET_WRITES_TOTAL.with_label_values(&[operation]).inc();
}

pub fn increment_status_updates() {
    STATUS_UPDATES_TOTAL.inc();
}

pub fn increment_entry_failures(count: usize) {
    ENTRY_FAILURES_TOTAL.inc_by(count as u64);
}

pub fn observe_vault_request(operation: &str, outcome: &str, duration: f64) {
    VAULT_REQUESTS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    VAULT_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_vault_cache_hits() {
    VAULT_CACHE_HITS_TOTAL.inc();
}

pub fn increment_vault_logins(method: &str, outcome: &str) {
    VAULT_LOGINS_TOTAL.with_label_values(&[method, outcome]).inc();
}

//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;

/// Namespaces watched for VaultSecret resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchScope {
    /// Every namespace of the cluster
    Cluster,
    /// Only the listed namespaces
    Namespaces(Vec<String>),
}

/// Controller-level configuration
///
/// All settings have sensible defaults. All but the Secret update interval can
/// be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Reconciliation error requeue interval (seconds)
    /// How long to wait before retrying a failed reconciliation
    pub reconciliation_error_requeue_secs: u64,
    /// Resync period used when a VaultSecret has no `syncPeriod` (seconds)
    pub default_sync_period_secs: u64,
    /// Minimum interval between two writes of the same Secret (milliseconds)
    /// Not read from the environment; always `MIN_TIME_BETWEEN_SECRET_UPDATE_MS`
    /// outside of tests
    pub min_secret_update_interval_ms: u64,
    /// Timeout of a single Vault HTTP request (seconds)
    pub vault_http_timeout_secs: u64,
    /// Attempts made when a Secret write hits an optimistic-concurrency conflict
    pub conflict_retry_steps: u32,
    /// Delay before the first conflict retry (milliseconds)
    pub conflict_retry_initial_ms: u64,
    /// Multiplier applied to the conflict retry delay
    pub conflict_retry_factor: u32,
    /// Cap of a single conflict retry delay (milliseconds)
    pub conflict_retry_max_ms: u64,
    /// Watch stream restart delay after the stream ends (seconds)
    pub watch_restart_delay_secs: u64,
    /// Value of the `app.kubernetes.io/managed-by` label
    pub operator_name: String,
    /// Namespaces to watch
    pub watch_scope: WatchScope,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            default_sync_period_secs: DEFAULT_SYNC_PERIOD_SECS,
            min_secret_update_interval_ms: MIN_TIME_BETWEEN_SECRET_UPDATE_MS,
            vault_http_timeout_secs: DEFAULT_VAULT_HTTP_TIMEOUT_SECS,
            conflict_retry_steps: DEFAULT_CONFLICT_RETRY_STEPS,
            conflict_retry_initial_ms: DEFAULT_CONFLICT_RETRY_INITIAL_MS,
            conflict_retry_factor: DEFAULT_CONFLICT_RETRY_FACTOR,
            conflict_retry_max_ms: DEFAULT_CONFLICT_RETRY_MAX_MS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            operator_name: OPERATOR_APP_NAME.to_string(),
            watch_scope: WatchScope::Cluster,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            reconciliation_error_requeue_secs: env_var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ),
            default_sync_period_secs: env_var_or_default(
                "DEFAULT_SYNC_PERIOD_SECS",
                DEFAULT_SYNC_PERIOD_SECS,
            ),
            min_secret_update_interval_ms: MIN_TIME_BETWEEN_SECRET_UPDATE_MS,
            vault_http_timeout_secs: env_var_or_default(
                "VAULT_HTTP_TIMEOUT_SECS",
                DEFAULT_VAULT_HTTP_TIMEOUT_SECS,
            ),
            conflict_retry_steps: env_var_or_default(
                "CONFLICT_RETRY_STEPS",
                DEFAULT_CONFLICT_RETRY_STEPS,
            ),
            conflict_retry_initial_ms: env_var_or_default(
                "CONFLICT_RETRY_INITIAL_MS",
                DEFAULT_CONFLICT_RETRY_INITIAL_MS,
            ),
            conflict_retry_factor: env_var_or_default(
                "CONFLICT_RETRY_FACTOR",
                DEFAULT_CONFLICT_RETRY_FACTOR,
            ),
            conflict_retry_max_ms: env_var_or_default(
                "CONFLICT_RETRY_MAX_MS",
                DEFAULT_CONFLICT_RETRY_MAX_MS,
            ),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            operator_name: env_var_or_default_str("OPERATOR_NAME", OPERATOR_APP_NAME),
            watch_scope: watch_scope(
                std::env::var("WATCH_NAMESPACE").ok().as_deref(),
                std::env::var("WATCH_MULTINAMESPACES").ok().as_deref(),
            ),
        }
    }

    /// Get reconciliation error requeue duration
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    /// Get default sync period duration
    pub fn default_sync_period(&self) -> Duration {
        Duration::from_secs(self.default_sync_period_secs)
    }

    /// Get minimum Secret update interval duration
    pub fn min_secret_update_interval(&self) -> Duration {
        Duration::from_millis(self.min_secret_update_interval_ms)
    }

    /// Get Vault HTTP timeout duration
    pub fn vault_http_timeout(&self) -> Duration {
        Duration::from_secs(self.vault_http_timeout_secs)
    }

    /// Get watch restart delay duration
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}

/// `WATCH_MULTINAMESPACES` (comma separated) takes precedence over
/// `WATCH_NAMESPACE`; neither set means cluster wide
fn watch_scope(single: Option<&str>, multiple: Option<&str>) -> WatchScope {
    let namespaces: Vec<String> = multiple
        .filter(|value| !value.trim().is_empty())
        .or(single)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .map(str::to_string)
        .collect();

    if namespaces.is_empty() {
        WatchScope::Cluster
    } else {
        WatchScope::Namespaces(namespaces)
    }
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

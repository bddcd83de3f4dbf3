//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Application name, used for the `app.kubernetes.io/name` label and as the
/// default `app.kubernetes.io/managed-by` value
pub const OPERATOR_APP_NAME: &str = "vaultsecret-operator";

/// Field manager / user agent used when talking to the Kubernetes API
pub const FIELD_MANAGER: &str = "vault-secret-controller";

/// Format of the `lastUpdate` label written on every materialized Secret
/// Colons are not allowed in label values
pub const LAST_UPDATE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Minimum interval between two writes of the same target Secret (milliseconds)
/// Independent of the resource's syncPeriod
pub const MIN_TIME_BETWEEN_SECRET_UPDATE_MS: u64 = 500;

/// Warning returned by Vault when a version 1 path is read on a version 2 mount
pub const KV_VERSIONED_WARNING: &str = "Invalid path for a versioned K/V secrets engine.";

/// Default Secret type when the resource does not set one
pub const DEFAULT_SECRET_TYPE: &str = "Opaque";

/// Default AppRole auth mount path
pub const DEFAULT_APPROLE_MOUNT: &str = "approle";

/// Default service account used for Kubernetes auth
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

/// Field of the service account token secret holding the JWT
pub const SERVICE_ACCOUNT_TOKEN_FIELD: &str = "token";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 60;

/// Default resync period when `syncPeriod` is not set (seconds)
pub const DEFAULT_SYNC_PERIOD_SECS: u64 = 300;

/// Default timeout for a single Vault HTTP request (seconds)
pub const DEFAULT_VAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts for optimistic-concurrency conflict retries
pub const DEFAULT_CONFLICT_RETRY_STEPS: u32 = 4;

/// Default delay before the first conflict retry (milliseconds)
pub const DEFAULT_CONFLICT_RETRY_INITIAL_MS: u64 = 10;

/// Default multiplier applied to the conflict retry delay after each attempt
pub const DEFAULT_CONFLICT_RETRY_FACTOR: u32 = 5;

/// Default cap for a single conflict retry delay (milliseconds)
pub const DEFAULT_CONFLICT_RETRY_MAX_MS: u64 = 1000;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Status message for an entry whose backend read failed
pub const STATUS_MESSAGE_READ_FAILED: &str = "Problem occurred while reading secret";

/// Status message for an entry whose field is missing or empty
pub const STATUS_MESSAGE_FIELD_MISSING: &str = "Field does not exist";

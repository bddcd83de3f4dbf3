//! # Update-Rate Gate
//!
//! Suppresses writes of the same Secret arriving closer together than a fixed
//! minimum interval, independently of each resource's sync period.
//!
//! Keys are `{namespace}/{secret name}`. A pass is admitted when the key has
//! no recorded update or the last recorded update is strictly older than the
//! interval. Callers record an update only once their write has succeeded.
//! The lock is held for the lookup or the record, never across I/O.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

#[derive(Debug)]
pub struct UpdateRateGate {
    min_interval: Duration,
    last_updates: Mutex<HashMap<String, Instant>>,
}

impl UpdateRateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_updates: Mutex::new(HashMap::new()),
        }
    }

    /// Gate key of a target Secret
    pub fn key(namespace: &str, secret_name: &str) -> String {
        format!("{namespace}/{secret_name}")
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Whether a pass for `key` may proceed now
    pub fn try_enter(&self, key: &str) -> bool {
        self.try_enter_at(key, Instant::now())
    }

    pub fn try_enter_at(&self, key: &str, now: Instant) -> bool {
        let last_updates = match self.last_updates.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Update-rate gate lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        last_updates
            .get(key)
            .is_none_or(|last| now.saturating_duration_since(*last) > self.min_interval)
    }

    /// Record a successful write of `key`
    pub fn record_update(&self, key: &str) {
        self.record_update_at(key, Instant::now());
    }

    pub fn record_update_at(&self, key: &str, at: Instant) {
        let mut last_updates = match self.last_updates.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Update-rate gate lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        last_updates.insert(key.to_string(), at);
    }
}

impl Default for UpdateRateGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(
            crate::constants::MIN_TIME_BETWEEN_SECRET_UPDATE_MS,
        ))
    }
}

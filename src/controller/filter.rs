//! # Label Filter
//!
//! Restricts the controller to VaultSecrets carrying every configured
//! `key=value` label pair. The same pairs are stamped on materialized Secrets
//! so that owned objects pass the filter too.

use std::collections::BTreeMap;

use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFilter {
    labels: BTreeMap<String, String>,
}

impl LabelFilter {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }

    /// Build a filter from `key=value` arguments; malformed ones are logged and skipped
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let mut labels = BTreeMap::new();
        for arg in args {
            let arg = arg.as_ref();
            match arg.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    labels.insert(key.trim().to_string(), value.trim().to_string());
                }
                _ => error!("Ignoring malformed filter label '{}', expected key=value", arg),
            }
        }
        Self { labels }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Whether an object with `labels` should be reconciled
    pub fn admits(&self, labels: &BTreeMap<String, String>) -> bool {
        self.labels
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }

    /// Equivalent server-side label selector, `None` when the filter is empty
    pub fn selector(&self) -> Option<String> {
        if self.labels.is_empty() {
            return None;
        }
        Some(
            self.labels
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

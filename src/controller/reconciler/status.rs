//! # Status
//!
//! Decides whether the VaultSecret status needs a write.

use crate::crd::{StatusEntry, VaultSecretStatus};

/// Whether `entries` differ from the stored status
pub fn status_changed(current: Option<&VaultSecretStatus>, entries: &[StatusEntry]) -> bool {
    let stored = current.map_or(&[][..], |status| status.entries.as_slice());
    stored != entries
}

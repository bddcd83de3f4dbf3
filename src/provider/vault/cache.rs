//! # Resolution Cache
//!
//! Deduplicates reads of the same KV item within one reconcile pass.
//! Entries are keyed by `{mount}/{item}`, regardless of the field or version
//! requested. Failed and empty reads are never cached.

use std::collections::HashMap;

use crate::observability::metrics;
use crate::provider::vault::errors::VaultError;
use crate::provider::vault::reader::{FieldMap, KvReader, KvVersion};
use crate::provider::VaultTransport;

#[derive(Debug)]
pub struct CachedReader<'a, T> {
    reader: KvReader<'a, T>,
    entries: HashMap<String, FieldMap>,
}

impl<'a, T: VaultTransport> CachedReader<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            reader: KvReader::new(transport),
            entries: HashMap::new(),
        }
    }

    pub async fn read(
        &mut self,
        mount: &str,
        item: &str,
        version: KvVersion,
    ) -> Result<FieldMap, VaultError> {
        let key = format!("{mount}/{item}");
        if let Some(fields) = self.entries.get(&key) {
            metrics::increment_vault_cache_hits();
            return Ok(fields.clone());
        }

        let fields = self.reader.read(mount, item, version).await?;
        if !fields.is_empty() {
            self.entries.insert(key, fields.clone());
        }
        Ok(fields)
    }
}

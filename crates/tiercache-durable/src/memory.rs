//! In-process durable tier.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::DurableError;
use crate::tier::{DurableRecord, DurableTier};

/// A durable tier backed by a map in this process.
///
/// Nothing survives a restart, so this is only "durable" relative to the
/// memory tier's eviction. Useful for development, single-node
/// deployments and as a test double.
#[derive(Debug, Default)]
pub struct MemoryDurableTier {
    records: RwLock<HashMap<String, DurableRecord>>,
}

impl MemoryDurableTier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.read().contains_key(key)
    }

    /// Returns a copy of the record under `key` without going through the
    /// async trait.
    pub fn peek(&self, key: &str) -> Option<DurableRecord> {
        self.records.read().get(key).cloned()
    }
}

#[async_trait]
impl DurableTier for MemoryDurableTier {
    async fn get(&self, key: &str) -> Result<Option<DurableRecord>, DurableError> {
        Ok(self.peek(key))
    }

    async fn set(&self, record: &DurableRecord) -> Result<(), DurableError> {
        debug!(key = %record.cache_key, "storing durable record");
        self.records
            .write()
            .insert(record.cache_key.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DurableError> {
        self.records.write().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), DurableError> {
        self.records.write().clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

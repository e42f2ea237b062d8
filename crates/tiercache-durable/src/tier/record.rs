//! Wire shape of a durable cache record.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tiercache_core::CacheEntry;

use crate::error::DurableError;

/// A cache entry as persisted by the durable tier.
///
/// Field names match the storage schema: `ttl` is an integer number of
/// milliseconds and `created_at` an RFC 3339 timestamp. The creation time
/// travels with the record so a promoted entry keeps its original clock.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use chrono::Utc;
/// use tiercache_core::CacheEntry;
/// use tiercache_durable::DurableRecord;
///
/// let entry = CacheEntry::new(vec![1, 2, 3], Utc::now(), Duration::from_secs(30), ["meals"]);
/// let record = DurableRecord::from_entry("household:7:meals", &entry).unwrap();
///
/// assert_eq!(record.ttl, 30_000);
/// let back: CacheEntry<Vec<u8>> = record.into_entry().unwrap();
/// assert_eq!(back.value(), &vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurableRecord {
    pub cache_key: String,
    pub cache_value: serde_json::Value,
    /// Time-to-live in milliseconds.
    pub ttl: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl DurableRecord {
    /// Encodes an entry for storage.
    pub fn from_entry<V: Serialize>(
        key: impl Into<String>,
        entry: &CacheEntry<V>,
    ) -> Result<Self, DurableError> {
        Ok(Self {
            cache_key: key.into(),
            cache_value: serde_json::to_value(entry.value())?,
            ttl: u64::try_from(entry.ttl().as_millis()).unwrap_or(u64::MAX),
            tags: entry.tags().iter().cloned().collect(),
            created_at: entry.created_at(),
        })
    }

    /// Decodes the record back into an entry, keeping `created_at`.
    pub fn into_entry<V: DeserializeOwned>(self) -> Result<CacheEntry<V>, DurableError> {
        let ttl = self.ttl();
        let value = serde_json::from_value(self.cache_value)?;
        Ok(CacheEntry::new(value, self.created_at, ttl, self.tags))
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl)
    }

    /// Returns true if the record is expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        i64::try_from(self.ttl)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
            .is_some_and(|expires_at| now > expires_at)
    }
}

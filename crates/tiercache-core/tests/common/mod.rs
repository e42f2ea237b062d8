#![allow(dead_code)]
use std::time::Duration;

use chrono::{DateTime, Utc};
use tiercache_core::CacheEntry;

/// Instant `secs` seconds after the Unix epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).expect("timestamp in range")
}

/// Entry with a one minute TTL created at `created`.
pub fn entry(value: u32, created: i64, tags: &[&str]) -> CacheEntry<u32> {
    CacheEntry::new(
        value,
        at(created),
        Duration::from_secs(60),
        tags.iter().copied(),
    )
}

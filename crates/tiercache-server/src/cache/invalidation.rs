//! Tag-based invalidation.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

use super::manager::{CacheManager, CacheValue, guarded};

/// Outcome of [`CacheManager::invalidate_by_tags`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidationResult {
    /// Number of memory entries removed.
    pub count: usize,
    /// Distinct tags that were invalidated, sorted.
    pub tags: Vec<String>,
}

impl<V: CacheValue> CacheManager<V> {
    /// Removes every entry carrying at least one of `tags`.
    ///
    /// Matching keys leave memory together under one lock, so no reader sees
    /// a partially invalidated tag. Durable deletes are then issued
    /// concurrently and best effort, each under the usual deadline; an
    /// unreachable store costs one timeout, not one per key.
    ///
    /// Each tag also gets a watermark at the current instant:
    /// durable records tagged with it and created at or before that instant
    /// are never promoted again, even if the durable delete was lost or the
    /// key had already been evicted from memory.
    pub async fn invalidate_by_tags<I, S>(&self, tags: I) -> InvalidationResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if tags.is_empty() {
            return InvalidationResult { count: 0, tags };
        }

        let now = self.clock.now();
        {
            let mut watermarks = self.watermarks.lock();
            for tag in &tags {
                watermarks.insert(tag.clone(), now);
            }
        }

        // Collected after the watermarks are in place so a concurrent
        // promotion either sees the watermark or lands in this key set.
        let keys: Vec<String> = {
            let mut memory = self.memory.lock();
            let keys: Vec<String> = memory.keys_for_tags(&tags).into_iter().collect();
            for key in &keys {
                memory.remove(key);
            }
            self.stats.update_entry_count(memory.size());
            keys
        };
        let count = keys.len();

        if let Some(durable) = &self.durable {
            let deletes = keys.iter().map(|key| {
                guarded(
                    self.config.durable_timeout,
                    "delete",
                    key,
                    &self.stats,
                    durable.delete(key),
                )
            });
            join_all(deletes).await;
        }

        self.stats.record_evictions("invalidated", count);
        info!(tags = ?tags, count, "invalidated cache entries by tag");

        InvalidationResult { count, tags }
    }

    /// Number of tags currently holding an invalidation watermark.
    pub fn watermark_count(&self) -> usize {
        self.watermarks.lock().len()
    }

    /// True if any of `tags` was invalidated at or after `created_at`.
    pub(super) fn is_invalidated(&self, created_at: DateTime<Utc>, tags: &BTreeSet<String>) -> bool {
        let watermarks = self.watermarks.lock();
        tags.iter()
            .filter_map(|tag| watermarks.get(tag))
            .any(|watermark| created_at <= *watermark)
    }

    /// Drops watermarks older than the maximum TTL.
    ///
    /// Any record a pruned watermark could reject has expired by then.
    pub(super) fn prune_watermarks(&self, now: DateTime<Utc>) -> usize {
        let Ok(horizon) = TimeDelta::from_std(self.config.max_ttl) else {
            return 0;
        };
        let Some(cutoff) = now.checked_sub_signed(horizon) else {
            return 0;
        };

        let mut watermarks = self.watermarks.lock();
        let before = watermarks.len();
        watermarks.retain(|_, watermark| *watermark >= cutoff);
        let pruned = before - watermarks.len();

        if pruned > 0 {
            debug!(pruned, remaining = watermarks.len(), "pruned tag watermarks");
        }
        pruned
    }
}

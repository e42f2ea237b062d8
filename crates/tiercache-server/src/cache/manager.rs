//! The two-tier cache manager.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use tiercache_core::{CacheEntry, CacheError, Clock, MemoryTier, SystemClock, validation};
use tiercache_durable::{DurableError, DurableRecord, DurableTier};
use tracing::{debug, warn};

use crate::metrics::{CacheStats, StatsCollector};

/// Values the cache can hold: cloneable for memory hits and serializable
/// for the durable tier.
pub trait CacheValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied when `set` is called without one (default: 5 minutes)
    pub default_ttl: Duration,
    /// Largest TTL accepted by `set` (default: 7 days)
    pub max_ttl: Duration,
    /// Capacity of the memory tier (default: 10000)
    pub max_entries: usize,
    /// Fraction of `max_entries` whose crossing triggers maintenance (default: 0.8)
    pub high_water_ratio: f64,
    /// Deadline for every durable tier call (default: 2 seconds)
    pub durable_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            max_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            max_entries: 10_000,
            high_water_ratio: 0.8,
            durable_timeout: Duration::from_secs(2),
        }
    }
}

impl CacheConfig {
    /// Size whose crossing makes a write run sweep and eviction.
    pub fn high_water_mark(&self) -> usize {
        let ratio = self.high_water_ratio.clamp(0.0, 1.0);
        (self.max_entries as f64 * ratio).floor() as usize
    }
}

/// Per-call options for [`CacheManager::set`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tiercache_server::cache::SetOptions;
///
/// let options = SetOptions::new()
///     .ttl(Duration::from_secs(60))
///     .tags(["meals", "household:42"]);
/// assert_eq!(options.tags.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// TTL override; the configured default applies when `None`.
    pub ttl: Option<Duration>,
    pub tags: Vec<String>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// Multi-tier cache: a bounded in-process memory tier in front of an
/// optional durable tier.
///
/// Reads consult memory first and fall back to the durable tier, promoting
/// durable hits with their original creation time. Writes land in memory
/// synchronously and are written through to the durable tier in the
/// background. The durable tier is never allowed to fail a caller: its
/// errors and timeouts are logged and the cache behaves as memory-only.
///
/// One manager is built at startup and shared as `Arc<CacheManager<V>>`.
///
/// # Examples
///
/// ```no_run
/// use tiercache_server::cache::{CacheConfig, CacheManager, SetOptions};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), tiercache_core::CacheError> {
/// let cache: CacheManager<String> = CacheManager::new(CacheConfig::default());
///
/// cache.set("household:42:menu", "tacos".to_string(), SetOptions::new().tag("meals"))?;
/// assert_eq!(cache.get("household:42:menu").await.as_deref(), Some("tacos"));
/// # Ok(())
/// # }
/// ```
pub struct CacheManager<V> {
    pub(super) memory: Mutex<MemoryTier<V>>,
    pub(super) durable: Option<Arc<dyn DurableTier>>,
    /// Last invalidation instant per tag.
    pub(super) watermarks: Mutex<HashMap<String, DateTime<Utc>>>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) stats: StatsCollector,
    pub(super) config: CacheConfig,
}

impl<V: CacheValue> CacheManager<V> {
    /// Creates a memory-only cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            memory: Mutex::new(MemoryTier::new()),
            durable: None,
            watermarks: Mutex::new(HashMap::new()),
            clock: Arc::new(SystemClock),
            stats: StatsCollector::new(),
            config,
        }
    }

    /// Creates a cache backed by `durable`.
    pub fn with_durable(config: CacheConfig, durable: Arc<dyn DurableTier>) -> Self {
        Self {
            durable: Some(durable),
            ..Self::new(config)
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the value stored under `key`, if any tier has a live copy.
    ///
    /// Expired memory entries are removed on discovery. Durable hits are
    /// promoted into memory keeping their original `created_at`, so the
    /// remaining TTL accounts for time spent in durable storage.
    pub async fn get(&self, key: &str) -> Option<V> {
        let start = Instant::now();

        if let Some(value) = self.get_from_memory(key) {
            self.stats.record_memory_hit();
            self.stats
                .record_operation_duration("get_memory_hit", start.elapsed());
            return Some(value);
        }

        let value = self.get_from_durable(key).await;
        match value {
            Some(_) => {
                self.stats.record_durable_hit();
                self.stats
                    .record_operation_duration("get_durable_hit", start.elapsed());
            },
            None => {
                self.stats.record_miss();
                self.stats
                    .record_operation_duration("get_miss", start.elapsed());
            },
        }
        value
    }

    /// Stores `value` under `key`.
    ///
    /// The memory write is synchronous: a following `get` in this process
    /// observes it. The durable write is fire-and-forget. Fails only on
    /// invalid input, before either tier is touched.
    pub fn set(&self, key: impl Into<String>, value: V, options: SetOptions) -> Result<(), CacheError> {
        let start = Instant::now();
        let key = key.into();

        validation::validate_key(&key)?;
        validation::validate_tags(options.tags.iter().map(String::as_str))?;
        let ttl = options.ttl.unwrap_or(self.config.default_ttl);
        validation::validate_ttl(ttl, self.config.max_ttl)?;

        let now = self.clock.now();
        let entry = CacheEntry::new(value, now, ttl, options.tags);
        let record = self.durable.as_ref().and_then(|_| {
            DurableRecord::from_entry(&key, &entry)
                .inspect_err(|e| {
                    warn!(operation = "set", key = %key, error = %e, "failed to encode value for durable tier");
                    self.stats.record_durable_fault("set");
                })
                .ok()
        });

        {
            let mut memory = self.memory.lock();
            let size_before = memory.size();
            memory.put(key.clone(), entry);
            self.maintain_after_insert(&mut memory, size_before, now);
            self.stats.update_entry_count(memory.size());
        }

        if let (Some(durable), Some(record)) = (&self.durable, record) {
            self.write_behind(Arc::clone(durable), record);
        }

        self.stats
            .record_operation_duration("set", start.elapsed());
        Ok(())
    }

    /// Removes `key` from memory, then best-effort from the durable tier.
    ///
    /// The durable delete is not ordered against a still pending write-behind
    /// from an earlier `set`, which may land afterwards and leave the record
    /// in the durable tier until its TTL runs out.
    ///
    /// Returns true if the memory tier held the key.
    pub async fn delete(&self, key: &str) -> bool {
        let removed = {
            let mut memory = self.memory.lock();
            let removed = memory.remove(key).is_some();
            self.stats.update_entry_count(memory.size());
            removed
        };

        if let Some(durable) = &self.durable {
            let _ = guarded(
                self.config.durable_timeout,
                "delete",
                key,
                &self.stats,
                durable.delete(key),
            )
            .await;
        }

        removed
    }

    /// Empties the memory tier and issues a best-effort durable clear.
    pub async fn clear(&self) {
        {
            let mut memory = self.memory.lock();
            memory.clear();
            self.stats.update_entry_count(0);
        }

        if let Some(durable) = &self.durable {
            let _ = guarded(
                self.config.durable_timeout,
                "clear",
                "*",
                &self.stats,
                durable.clear(),
            )
            .await;
        }

        debug!("cache cleared");
    }

    /// Current counters and memory size.
    pub fn get_stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    /// Number of entries in the memory tier, expired ones included.
    pub fn len(&self) -> usize {
        self.memory.lock().size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Name of the durable tier, if one is attached.
    pub fn durable_name(&self) -> Option<&str> {
        self.durable.as_deref().map(|d| d.name())
    }

    /// Checks the durable tier under the usual deadline.
    ///
    /// `None` when no durable tier is attached.
    pub async fn check_durable(&self) -> Option<Result<(), DurableError>> {
        let durable = self.durable.as_ref()?;
        Some(
            guarded(
                self.config.durable_timeout,
                "health_check",
                "-",
                &self.stats,
                durable.health_check(),
            )
            .await,
        )
    }

    /// Checks the memory tier's tag index against its entries.
    pub fn is_index_consistent(&self) -> bool {
        self.memory.lock().is_index_consistent()
    }

    /// Reads memory, dropping the entry if it turns out to be expired.
    fn get_from_memory(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut memory = self.memory.lock();

        let live = memory
            .get(key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.value().clone()));

        match live {
            Some(Some(value)) => Some(value),
            Some(None) => {
                memory.remove(key);
                self.stats.record_evictions("ttl", 1);
                self.stats.update_entry_count(memory.size());
                debug!(key = %key, "expired entry removed on read");
                None
            },
            None => None,
        }
    }

    async fn get_from_durable(&self, key: &str) -> Option<V> {
        let durable = self.durable.as_ref()?;
        let record = guarded(
            self.config.durable_timeout,
            "get",
            key,
            &self.stats,
            durable.get(key),
        )
        .await
        .ok()??;

        let now = self.clock.now();
        if record.is_expired(now) {
            debug!(key = %key, "durable record expired");
            return None;
        }

        let entry: CacheEntry<V> = match record.into_entry() {
            Ok(entry) => entry,
            Err(e) => {
                warn!(operation = "get", key = %key, error = %e, "failed to decode durable record");
                self.stats.record_durable_fault("get");
                return None;
            },
        };

        self.promote(key, entry, now)
    }

    /// Copies a durable hit into memory.
    ///
    /// A live memory entry written while the durable call was in flight
    /// wins over the older durable copy. Records created at or before the
    /// last invalidation of one of their tags are refused.
    fn promote(&self, key: &str, entry: CacheEntry<V>, now: DateTime<Utc>) -> Option<V> {
        let mut memory = self.memory.lock();

        if let Some(live) = memory.get(key).filter(|e| !e.is_expired(now)) {
            return Some(live.value().clone());
        }

        if self.is_invalidated(entry.created_at(), entry.tags()) {
            debug!(key = %key, "durable record predates a tag invalidation");
            return None;
        }

        let value = entry.value().clone();
        let size_before = memory.size();
        memory.put(key, entry);
        self.maintain_after_insert(&mut memory, size_before, now);
        self.stats.update_entry_count(memory.size());

        debug!(key = %key, "durable hit promoted to memory");
        Some(value)
    }

    /// Runs maintenance when an insert crosses the high-water mark or
    /// overflows capacity. Returns true if a pass ran.
    ///
    /// An overflow evicts down to one above the mark, so the following
    /// insert is not a crossing and the next overflow is
    /// `max_entries - high_water_mark` inserts away. Inserts landing between
    /// the mark and capacity run nothing.
    fn maintain_after_insert(
        &self,
        memory: &mut MemoryTier<V>,
        size_before: usize,
        now: DateTime<Utc>,
    ) -> bool {
        let mark = self.config.high_water_mark();
        let size = memory.size();

        if size > self.config.max_entries {
            let target = (mark + 1).min(self.config.max_entries);
            self.maintain_locked(memory, now, target);
            true
        } else if size_before <= mark && size > mark {
            self.maintain_locked(memory, now, self.config.max_entries);
            true
        } else {
            false
        }
    }

    /// Sweeps expired entries then evicts down to `target` entries.
    ///
    /// Returns `(expired, evicted)`.
    pub(super) fn maintain_locked(
        &self,
        memory: &mut MemoryTier<V>,
        now: DateTime<Utc>,
        target: usize,
    ) -> (usize, usize) {
        let expired = memory.sweep_expired(now);
        let evicted = memory.evict_to_capacity(target);

        self.stats.record_evictions("ttl", expired);
        self.stats.record_evictions("capacity", evicted);
        if expired + evicted > 0 {
            debug!(expired, evicted, size = memory.size(), "memory tier maintenance");
        }
        (expired, evicted)
    }

    /// Spawns the durable write for `record`.
    fn write_behind(&self, durable: Arc<dyn DurableTier>, record: DurableRecord) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(operation = "set", key = %record.cache_key, "no async runtime, durable write skipped");
            return;
        };

        let deadline = self.config.durable_timeout;
        let stats = self.stats.clone();
        runtime.spawn(async move {
            let _ = guarded(
                deadline,
                "set",
                &record.cache_key,
                &stats,
                durable.set(&record),
            )
            .await;
        });
    }
}

impl<V> std::fmt::Debug for CacheManager<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("durable", &self.durable.as_deref().map(|d| d.name()))
            .field("config", &self.config)
            .finish()
    }
}

/// Runs a durable tier call under a deadline.
///
/// Failures are logged with the operation and key and counted; callers are
/// expected to treat an `Err` as a miss or a no-op.
pub(super) async fn guarded<T>(
    deadline: Duration,
    operation: &'static str,
    key: &str,
    stats: &StatsCollector,
    call: impl Future<Output = Result<T, DurableError>>,
) -> Result<T, DurableError> {
    let result = match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(DurableError::timeout(deadline)),
    };

    if let Err(e) = &result {
        warn!(
            operation,
            key = %key,
            kind = e.kind(),
            error = %e,
            "durable tier call failed, continuing without it"
        );
        stats.record_durable_fault(operation);
    }

    result
}

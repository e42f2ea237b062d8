//! Cache statistics and metrics recording.

use metrics::{counter, gauge, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Registers the cache metric descriptions.
/// Call once at startup.
pub fn register_cache_metrics() {
    metrics::describe_counter!(
        "tiercache_cache_hits_total",
        "Total number of cache hits, labelled by tier"
    );
    metrics::describe_counter!(
        "tiercache_cache_misses_total",
        "Total number of cache misses"
    );
    metrics::describe_counter!(
        "tiercache_cache_evictions_total",
        "Total number of entries removed from the memory tier, labelled by reason"
    );
    metrics::describe_counter!(
        "tiercache_durable_faults_total",
        "Total number of durable tier failures, labelled by operation"
    );
    metrics::describe_gauge!(
        "tiercache_cache_entries",
        "Current number of entries in the memory tier"
    );
    metrics::describe_histogram!(
        "tiercache_cache_operation_seconds",
        "Time spent on cache operations"
    );
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub memory_size: usize,
    pub memory_hits: u64,
    pub durable_hits: u64,
    pub misses: u64,
    pub total_hits: u64,
}

impl CacheStats {
    /// Fraction of lookups served by either tier.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.total_hits as f64 / total as f64
        }
    }
}

/// Hit/miss accounting for a cache manager.
///
/// Counters are monotonic and shared through `Arc`, so clones handed to
/// background tasks feed the same totals. Every event is mirrored to the
/// `metrics` facade.
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    memory_hits: Arc<AtomicU64>,
    durable_hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_cache_hits_total", "tier" => "memory").increment(1);
    }

    pub fn record_durable_hit(&self) {
        self.durable_hits.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_cache_hits_total", "tier" => "durable").increment(1);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_cache_misses_total").increment(1);
    }

    /// Records `count` removals for `reason` (`ttl`, `capacity`, `invalidated`).
    pub fn record_evictions(&self, reason: &'static str, count: usize) {
        if count > 0 {
            counter!("tiercache_cache_evictions_total", "reason" => reason).increment(count as u64);
        }
    }

    pub fn record_durable_fault(&self, operation: &'static str) {
        counter!("tiercache_durable_faults_total", "operation" => operation).increment(1);
    }

    pub fn update_entry_count(&self, count: usize) {
        gauge!("tiercache_cache_entries").set(count as f64);
    }

    pub fn record_operation_duration(&self, operation: &'static str, duration: Duration) {
        histogram!("tiercache_cache_operation_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }

    pub fn memory_hits(&self) -> u64 {
        self.memory_hits.load(Ordering::Relaxed)
    }

    pub fn durable_hits(&self) -> u64 {
        self.durable_hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Snapshot of the counters alongside the current memory size.
    pub fn snapshot(&self, memory_size: usize) -> CacheStats {
        let memory_hits = self.memory_hits();
        let durable_hits = self.durable_hits();
        CacheStats {
            memory_size,
            memory_hits,
            durable_hits,
            misses: self.misses(),
            total_hits: memory_hits + durable_hits,
        }
    }
}

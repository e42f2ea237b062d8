//! Periodic memory tier maintenance.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use super::manager::{CacheManager, CacheValue};

/// What a maintenance pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub expired: usize,
    pub evicted: usize,
    pub watermarks_pruned: usize,
}

impl MaintenanceReport {
    pub fn is_empty(&self) -> bool {
        self.expired == 0 && self.evicted == 0 && self.watermarks_pruned == 0
    }
}

impl<V: CacheValue> CacheManager<V> {
    /// Sweeps expired entries, evicts down to capacity and prunes stale
    /// tag watermarks.
    pub fn run_maintenance(&self) -> MaintenanceReport {
        let now = self.clock.now();

        let (expired, evicted) = {
            let mut memory = self.memory.lock();
            let removed = self.maintain_locked(&mut memory, now, self.config.max_entries);
            self.stats.update_entry_count(memory.size());
            removed
        };

        MaintenanceReport {
            expired,
            evicted,
            watermarks_pruned: self.prune_watermarks(now),
        }
    }
}

/// Configuration for the maintenance scheduler.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Interval between passes (default: 60 seconds)
    pub interval: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// Handle to a running scheduler. Dropping it stops the task.
pub struct MaintenanceHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl MaintenanceHandle {
    /// Signals the scheduler to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs [`CacheManager::run_maintenance`] on a fixed interval.
pub struct MaintenanceScheduler<V> {
    cache: Arc<CacheManager<V>>,
    config: MaintenanceConfig,
}

impl<V: CacheValue> MaintenanceScheduler<V> {
    pub fn new(cache: Arc<CacheManager<V>>, config: MaintenanceConfig) -> Self {
        Self { cache, config }
    }

    /// Spawns the scheduler on the current runtime.
    pub fn start(self) -> MaintenanceHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(interval = ?self.config.interval, "starting cache maintenance scheduler");
        tokio::spawn(self.run(shutdown_rx));

        MaintenanceHandle { shutdown_tx }
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut timer = interval(self.config.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let report = self.cache.run_maintenance();
                    if !report.is_empty() {
                        debug!(
                            expired = report.expired,
                            evicted = report.evicted,
                            watermarks_pruned = report.watermarks_pruned,
                            "scheduled maintenance pass"
                        );
                    }
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("cache maintenance scheduler stopped");
                        break;
                    }
                }
            }
        }
    }
}

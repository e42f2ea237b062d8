//! Two-tier cache: a bounded memory tier in front of an optional durable
//! tier, with tag invalidation, periodic maintenance and a memoizing
//! wrapper for async operations.

pub mod invalidation;
pub mod maintenance;
pub mod manager;
pub mod memoize;

// Re-exports
pub use invalidation::InvalidationResult;
pub use maintenance::{MaintenanceConfig, MaintenanceHandle, MaintenanceReport, MaintenanceScheduler};
pub use manager::{CacheConfig, CacheManager, CacheValue, SetOptions};
pub use memoize::{Memoized, memoize};

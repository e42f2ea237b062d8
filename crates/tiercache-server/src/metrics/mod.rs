//! Metrics for the tiercache server.

pub mod cache;
pub mod http;
pub mod setup;

pub use cache::{CacheStats, StatsCollector, register_cache_metrics};
pub use http::register_http_metrics;
pub use setup::init_metrics;

//! Tiercache server: the two-tier cache manager and its HTTP API.
//!
//! The [`cache`] module is usable as a library on its own; the rest of the
//! crate wires it into an axum service.

pub mod cache;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod state;

pub use cache::{CacheConfig, CacheManager, SetOptions};
pub use server::{RouterOptions, create_router, create_router_with_metrics, run_server};
pub use settings::Settings;
pub use state::AppState;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! # Tiercache Durable Tier
//!
//! Persistence tier for the tiercache multi-tier cache.
//!
//! This crate defines the narrow boundary between the in-process cache and a
//! networked key-value persistence service, plus the backends that speak it.
//!
//! ## Features
//!
//! - Async trait-based durable tier abstraction (`get`, `set`, `delete`, `clear`)
//! - Stable record wire shape carrying the original creation time
//! - In-process backend for development and tests
//! - PostgREST-compatible HTTP backend
//!
//! ## Example
//!
//! ```ignore
//! use tiercache_durable::{DurableTier, RestDurableConfig, RestDurableTier};
//!
//! let config = RestDurableConfig::builder()
//!     .base_url("https://db.example.com")
//!     .api_key(std::env::var("DB_API_KEY")?)
//!     .build()?;
//!
//! let tier = RestDurableTier::new(config)?;
//! let record = tier.get("household:42:meals").await?;
//! ```

pub mod error;
pub mod memory;
pub mod rest;
pub mod tier;

// Re-exports
pub use error::DurableError;
pub use memory::MemoryDurableTier;
pub use rest::{RestDurableConfig, RestDurableTier};
pub use tier::{DurableRecord, DurableTier};

// Re-export tiercache_core for consumers
pub use tiercache_core;

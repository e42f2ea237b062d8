//! Tiercache Core - Domain types for the multi-tier cache
//!
//! This crate holds the synchronous building blocks of the cache: the
//! [`CacheEntry`] type, the [`TagIndex`] used for bulk invalidation, the
//! capacity-bounded [`MemoryTier`], time sources and input validation. It
//! performs no I/O; the durable tier and the orchestrating cache manager
//! live in sibling crates.

pub mod clock;
pub mod entry;
pub mod error;
pub mod memory;
pub mod tag_index;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use error::{CacheError, Result};
pub use memory::MemoryTier;
pub use tag_index::TagIndex;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

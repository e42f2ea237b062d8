//! Durable tier abstraction.
//!
//! This module defines the [`DurableTier`] trait and the [`DurableRecord`]
//! shape records take on the wire.

mod record;
mod traits;

pub use record::DurableRecord;
pub use traits::DurableTier;

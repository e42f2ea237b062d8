//! Networked durable tier over a PostgREST-style HTTP API.

mod backend;
mod config;

pub use backend::RestDurableTier;
pub use config::{RestDurableConfig, RestDurableConfigBuilder};

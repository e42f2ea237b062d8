//! Shared helpers for tiercache-server integration tests.

#![allow(dead_code, unused_imports)]

pub mod client;
pub mod tiers;

pub use client::{TestClient, TestResponse, client, client_for};
pub use tiers::{FailingTier, HangingTier, eventually};

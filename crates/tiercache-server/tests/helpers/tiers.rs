//! Misbehaving durable tiers and polling helpers.

use std::time::Duration;

use async_trait::async_trait;
use tiercache_durable::{DurableError, DurableRecord, DurableTier};

/// Every call fails as if the store were down.
#[derive(Debug, Default)]
pub struct FailingTier;

#[async_trait]
impl DurableTier for FailingTier {
    async fn get(&self, _key: &str) -> Result<Option<DurableRecord>, DurableError> {
        Err(DurableError::unavailable("connection refused"))
    }

    async fn set(&self, _record: &DurableRecord) -> Result<(), DurableError> {
        Err(DurableError::unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<(), DurableError> {
        Err(DurableError::unavailable("connection refused"))
    }

    async fn clear(&self) -> Result<(), DurableError> {
        Err(DurableError::unavailable("connection refused"))
    }

    fn name(&self) -> &str {
        "failing"
    }

    async fn health_check(&self) -> Result<(), DurableError> {
        Err(DurableError::unavailable("connection refused"))
    }
}

/// Every call blocks forever.
#[derive(Debug, Default)]
pub struct HangingTier;

#[async_trait]
impl DurableTier for HangingTier {
    async fn get(&self, _key: &str) -> Result<Option<DurableRecord>, DurableError> {
        std::future::pending().await
    }

    async fn set(&self, _record: &DurableRecord) -> Result<(), DurableError> {
        std::future::pending().await
    }

    async fn delete(&self, _key: &str) -> Result<(), DurableError> {
        std::future::pending().await
    }

    async fn clear(&self) -> Result<(), DurableError> {
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "hanging"
    }

    async fn health_check(&self) -> Result<(), DurableError> {
        std::future::pending().await
    }
}

/// Polls `condition` until it holds, panicking after about two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

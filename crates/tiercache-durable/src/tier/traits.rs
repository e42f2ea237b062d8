//! Durable tier trait definition.

use async_trait::async_trait;

use super::DurableRecord;
use crate::error::DurableError;

/// The persistence tier behind the in-process cache.
///
/// This trait is the narrow boundary between the cache and a networked
/// key-value persistence service. The cache only ever needs four
/// operations; everything else about the store is its own business.
///
/// # Implementors
///
/// - `MemoryDurableTier` - In-process map, for development and tests
/// - `RestDurableTier` - PostgREST-compatible HTTP table
///
/// # Example
///
/// ```ignore
/// use tiercache_durable::{DurableTier, DurableRecord, DurableError};
///
/// struct MyTier;
///
/// #[async_trait]
/// impl DurableTier for MyTier {
///     async fn get(&self, key: &str) -> Result<Option<DurableRecord>, DurableError> {
///         Ok(None)
///     }
///
///     async fn set(&self, record: &DurableRecord) -> Result<(), DurableError> {
///         Ok(())
///     }
///
///     async fn delete(&self, key: &str) -> Result<(), DurableError> {
///         Ok(())
///     }
///
///     async fn clear(&self) -> Result<(), DurableError> {
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "my-tier"
///     }
/// }
/// ```
#[async_trait]
pub trait DurableTier: Send + Sync {
    /// Fetches the record stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored. Expiry is not judged
    /// here; callers compare `created_at + ttl` against their own clock.
    async fn get(&self, key: &str) -> Result<Option<DurableRecord>, DurableError>;

    /// Stores `record`, replacing any record under the same key.
    async fn set(&self, record: &DurableRecord) -> Result<(), DurableError>;

    /// Deletes the record under `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), DurableError>;

    /// Deletes every record.
    async fn clear(&self) -> Result<(), DurableError>;

    /// Returns the name of this tier, used for logging.
    fn name(&self) -> &str;

    /// Verifies the tier is reachable.
    ///
    /// The default implementation assumes it always is.
    async fn health_check(&self) -> Result<(), DurableError> {
        Ok(())
    }
}

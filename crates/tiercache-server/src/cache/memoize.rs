//! Read-through wrapper for async operations.

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use super::manager::{CacheManager, CacheValue, SetOptions};

/// An async operation whose successful results are cached.
///
/// Built by [`memoize`].
pub struct Memoized<V, K, F> {
    cache: Arc<CacheManager<V>>,
    options: SetOptions,
    key_builder: K,
    operation: F,
}

/// Wraps `operation` so results are served from `cache` when present.
///
/// `key_builder` derives the cache key from the arguments. On a miss the
/// operation runs and an `Ok` result is stored with `options`; errors are
/// returned to the caller and never cached.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tiercache_server::cache::{CacheConfig, CacheManager, SetOptions, memoize};
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache = Arc::new(CacheManager::<String>::new(CacheConfig::default()));
/// let lookup = memoize(
///     cache,
///     SetOptions::new().tag("users"),
///     |id: &u64| format!("user:{}", id),
///     |id: u64| async move { Ok::<_, std::io::Error>(format!("user #{}", id)) },
/// );
///
/// let name = lookup.call(7).await.unwrap();
/// assert_eq!(name, "user #7");
/// # }
/// ```
pub fn memoize<V, K, F>(
    cache: Arc<CacheManager<V>>,
    options: SetOptions,
    key_builder: K,
    operation: F,
) -> Memoized<V, K, F> {
    Memoized {
        cache,
        options,
        key_builder,
        operation,
    }
}

impl<V: CacheValue, K, F> Memoized<V, K, F> {
    /// Returns the cached result for `args`, running the operation on a miss.
    pub async fn call<A, E, Fut>(&self, args: A) -> Result<V, E>
    where
        K: Fn(&A) -> String,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = (self.key_builder)(&args);

        if let Some(value) = self.cache.get(&key).await {
            return Ok(value);
        }

        let value = (self.operation)(args).await?;

        if let Err(e) = self.cache.set(key.as_str(), value.clone(), self.options.clone()) {
            warn!(key = %key, error = %e, "memoized result not cached");
        }

        Ok(value)
    }

    pub fn cache(&self) -> &Arc<CacheManager<V>> {
        &self.cache
    }
}

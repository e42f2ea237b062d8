//! Input validation shared by every entry point into the cache.
//!
//! Keys and tags are opaque: the only requirement is that they are not
//! empty. TTLs must be strictly positive and no larger than the configured
//! ceiling.

use std::time::Duration;

use crate::error::{CacheError, Result};

/// Rejects empty keys.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::validation("key", "must not be empty"));
    }
    Ok(())
}

/// Rejects empty tags.
pub fn validate_tags<'a, I>(tags: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    if tags.into_iter().any(str::is_empty) {
        return Err(CacheError::validation("tags", "tag must not be empty"));
    }
    Ok(())
}

/// Rejects a zero TTL and any TTL above `max_ttl`.
pub fn validate_ttl(ttl: Duration, max_ttl: Duration) -> Result<()> {
    if ttl.is_zero() {
        return Err(CacheError::validation("ttl", "must be greater than zero"));
    }
    if ttl > max_ttl {
        return Err(CacheError::validation(
            "ttl",
            format!(
                "{}ms exceeds the maximum of {}ms",
                ttl.as_millis(),
                max_ttl.as_millis()
            ),
        ));
    }
    Ok(())
}

/// Converts a signed millisecond count (as found on the wire) into a TTL.
///
/// # Example
///
/// ```
/// use tiercache_core::validation::ttl_from_millis;
///
/// assert_eq!(ttl_from_millis(1500).unwrap().as_millis(), 1500);
/// assert!(ttl_from_millis(0).is_err());
/// assert!(ttl_from_millis(-5).is_err());
/// ```
pub fn ttl_from_millis(millis: i64) -> Result<Duration> {
    if millis <= 0 {
        return Err(CacheError::validation(
            "ttl",
            format!("must be greater than zero, got {}ms", millis),
        ));
    }
    Ok(Duration::from_millis(millis as u64))
}

//! Cache entries.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// A cached value together with its lifetime and tags.
///
/// An entry is *expired* iff `now > created_at + ttl`. A TTL too large to
/// be represented as an instant never expires.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use chrono::Utc;
/// use tiercache_core::CacheEntry;
///
/// let now = Utc::now();
/// let entry = CacheEntry::new("pasta", now, Duration::from_secs(60), ["meals"]);
///
/// assert!(!entry.is_expired(now));
/// assert!(entry.has_tag("meals"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    value: V,
    created_at: DateTime<Utc>,
    ttl: Duration,
    tags: BTreeSet<String>,
}

impl<V> CacheEntry<V> {
    /// Creates a new entry.
    pub fn new<I, S>(value: V, created_at: DateTime<Utc>, ttl: Duration, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value,
            created_at,
            ttl,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the creation instant.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the tag set.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns true if the entry carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns the expiry instant, or `None` if it lies beyond the
    /// representable range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = TimeDelta::from_std(self.ttl).ok()?;
        self.created_at.checked_add_signed(ttl)
    }

    /// Returns true if the entry is expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires_at| now > expires_at)
    }
}

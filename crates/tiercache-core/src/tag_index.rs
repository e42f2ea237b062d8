//! Reverse index from tag to keys.

use std::collections::{HashMap, HashSet};

/// Maps each tag to the set of keys currently carrying it.
///
/// Buckets are pruned when their last key is removed, so a tag present in
/// the index always has at least one key. Bulk invalidation touches only
/// the requested buckets instead of scanning every entry.
///
/// # Example
///
/// ```
/// use tiercache_core::TagIndex;
///
/// let mut index = TagIndex::new();
/// index.add_key_to_tags("a", ["g"]);
/// index.add_key_to_tags("b", ["g", "h"]);
///
/// let keys = index.keys_for_tags(["h"]);
/// assert_eq!(keys.len(), 1);
/// assert!(keys.contains("b"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct TagIndex {
    buckets: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `key` under each of `tags`.
    pub fn add_key_to_tags<I, S>(&mut self, key: &str, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.buckets
                .entry(tag.as_ref().to_string())
                .or_default()
                .insert(key.to_string());
        }
    }

    /// Removes `key` from each of `tags`, dropping buckets left empty.
    pub fn remove_key_from_tags<I, S>(&mut self, key: &str, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref();
            if let Some(bucket) = self.buckets.get_mut(tag) {
                bucket.remove(key);
                if bucket.is_empty() {
                    self.buckets.remove(tag);
                }
            }
        }
    }

    /// Returns the union of the buckets for `tags`.
    pub fn keys_for_tags<I, S>(&self, tags: I) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = HashSet::new();
        for tag in tags {
            if let Some(bucket) = self.buckets.get(tag.as_ref()) {
                keys.extend(bucket.iter().cloned());
            }
        }
        keys
    }

    /// Returns the bucket for a single tag.
    pub fn keys_for_tag(&self, tag: &str) -> Option<&HashSet<String>> {
        self.buckets.get(tag)
    }

    /// Number of distinct tags.
    pub fn tag_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Iterates over `(tag, keys)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashSet<String>)> {
        self.buckets.iter()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

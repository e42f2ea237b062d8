//! The in-process memory tier.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::entry::CacheEntry;
use crate::tag_index::TagIndex;

/// A stored entry plus its insertion sequence number.
#[derive(Debug)]
struct Slot<V> {
    entry: CacheEntry<V>,
    seq: u64,
}

/// Position of a key in creation order: `(created_at, insertion seq, key)`.
type OrderKey = (DateTime<Utc>, u64, String);

/// Bounded, synchronous key to entry store with a consistent [`TagIndex`].
///
/// The tier is a dumb store: [`get`](Self::get) does not judge expiry, that
/// is the caller's job. Every mutation updates the entry map, the
/// creation-order index and the tag index together, so a `&mut self` call
/// is one indivisible step per key.
///
/// Eviction is by creation order (smallest `created_at` first, ties broken
/// by insertion order). It is not LRU.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use chrono::Utc;
/// use tiercache_core::{CacheEntry, MemoryTier};
///
/// let mut tier = MemoryTier::new();
/// let now = Utc::now();
/// tier.put("a", CacheEntry::new(1, now, Duration::from_secs(60), ["g"]));
///
/// assert_eq!(tier.get("a").map(|e| *e.value()), Some(1));
/// assert!(tier.keys_for_tags(["g"]).contains("a"));
/// ```
#[derive(Debug)]
pub struct MemoryTier<V> {
    entries: HashMap<String, Slot<V>>,
    order: BTreeSet<OrderKey>,
    tags: TagIndex,
    next_seq: u64,
}

impl<V> Default for MemoryTier<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeSet::new(),
            tags: TagIndex::new(),
            next_seq: 0,
        }
    }
}

impl<V> MemoryTier<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry stored under `key`, expired or not.
    pub fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key).map(|slot| &slot.entry)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores `entry` under `key`, replacing any previous entry.
    ///
    /// Tags of the previous entry that the new one lacks are dropped from
    /// the index and new tags are added; the tag set is replaced, never
    /// merged. Returns the replaced entry.
    pub fn put(&mut self, key: impl Into<String>, entry: CacheEntry<V>) -> Option<CacheEntry<V>> {
        let key = key.into();
        let seq = self.next_seq;
        self.next_seq += 1;

        let previous = self.entries.remove(&key);
        if let Some(old) = &previous {
            self.order
                .remove(&(old.entry.created_at(), old.seq, key.clone()));
            let stale = old.entry.tags().difference(entry.tags());
            self.tags.remove_key_from_tags(&key, stale);
        }

        let added: Vec<&String> = match &previous {
            Some(old) => entry.tags().difference(old.entry.tags()).collect(),
            None => entry.tags().iter().collect(),
        };
        self.tags.add_key_to_tags(&key, added);

        self.order.insert((entry.created_at(), seq, key.clone()));
        self.entries.insert(key, Slot { entry, seq });

        previous.map(|slot| slot.entry)
    }

    /// Removes the entry under `key` and its tag associations.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let slot = self.entries.remove(key)?;
        self.order
            .remove(&(slot.entry.created_at(), slot.seq, key.to_string()));
        self.tags.remove_key_from_tags(key, slot.entry.tags());
        Some(slot.entry)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys carrying any of `tags`.
    pub fn keys_for_tags<I, S>(&self, tags: I) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.keys_for_tags(tags)
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.tags
    }

    /// Iterates over stored keys in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Removes every entry whose `created_at + ttl` lies before `now`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, slot)| slot.entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    /// Removes the oldest-created entries until at most `max_size` remain.
    ///
    /// Returns the number of entries evicted.
    pub fn evict_to_capacity(&mut self, max_size: usize) -> usize {
        let mut evicted = 0;
        while self.entries.len() > max_size {
            let Some((_, _, key)) = self.order.pop_first() else {
                break;
            };
            if let Some(slot) = self.entries.remove(&key) {
                self.tags.remove_key_from_tags(&key, slot.entry.tags());
                evicted += 1;
            }
        }
        evicted
    }

    /// Drops every entry and the whole tag index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.tags.clear();
    }

    /// Checks that the tag index exactly mirrors the stored entries.
    ///
    /// Every bucket must be non-empty and hold precisely the keys whose
    /// current entry carries that tag. Intended for tests and diagnostics;
    /// cost is linear in entries plus tags.
    pub fn is_index_consistent(&self) -> bool {
        let mut expected: HashMap<&str, HashSet<&str>> = HashMap::new();
        for (key, slot) in &self.entries {
            for tag in slot.entry.tags() {
                expected.entry(tag).or_default().insert(key);
            }
        }

        if expected.len() != self.tags.tag_count() {
            return false;
        }

        let buckets_match = self.tags.iter().all(|(tag, keys)| {
            !keys.is_empty()
                && expected.get(tag.as_str()).is_some_and(|want| {
                    want.len() == keys.len() && keys.iter().all(|k| want.contains(k.as_str()))
                })
        });

        buckets_match && self.order.len() == self.entries.len()
    }
}

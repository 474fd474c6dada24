//! Bounded, timestamped key/value store
//!
//! One [`Store`] backs each cache kind. Eviction is an approximate LRU: when
//! a new key arrives at capacity, the oldest tenth of the entries (at least
//! one) is dropped after a sort by creation time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Entries carry their creation time
pub(crate) trait Timestamped {
    /// Creation time in milliseconds since the Unix epoch
    fn timestamp(&self) -> i64;
}

/// Per-store counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Entries currently held
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped for capacity
    pub evictions: u64,
    /// Entries dropped for TTL, staleness or explicit invalidation
    pub invalidations: u64,
}

#[derive(Debug)]
struct Slot<E> {
    seq: u64,
    entry: E,
}

#[derive(Debug)]
pub(crate) struct Store<E> {
    slots: HashMap<String, Slot<E>>,
    capacity: usize,
    next_seq: u64,
    stats: StoreStats,
}

impl<E: Timestamped> Store<E> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            capacity,
            next_seq: 0,
            stats: StoreStats::default(),
        }
    }

    /// Look up `key`; entries failing `is_valid` are removed and count as a miss
    pub(crate) fn get(&mut self, key: &str, is_valid: impl FnOnce(&E) -> bool) -> Option<&E> {
        let valid = match self.slots.get(key) {
            None => {
                self.stats.misses += 1;
                return None;
            }
            Some(slot) => is_valid(&slot.entry),
        };

        if !valid {
            self.slots.remove(key);
            self.stats.invalidations += 1;
            self.stats.misses += 1;
            return None;
        }

        self.stats.hits += 1;
        self.slots.get(key).map(|slot| &slot.entry)
    }

    /// Insert, evicting the oldest entries first if a new key would exceed capacity
    pub(crate) fn insert(&mut self, key: String, entry: E) {
        if self.capacity == 0 {
            return;
        }
        if !self.slots.contains_key(&key) && self.slots.len() >= self.capacity {
            self.evict_oldest();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(key, Slot { seq, entry });
    }

    fn evict_oldest(&mut self) {
        let count = (self.slots.len() / 10).max(1);
        let mut by_age: Vec<(i64, u64, String)> = self
            .slots
            .iter()
            .map(|(key, slot)| (slot.entry.timestamp(), slot.seq, key.clone()))
            .collect();
        by_age.sort_unstable();

        for (_, _, key) in by_age.into_iter().take(count) {
            self.slots.remove(&key);
        }
        self.stats.evictions += count as u64;
        tracing::debug!(count, "evicted oldest cache entries");
    }

    /// Remove every entry matching `predicate`, returning how many were removed
    pub(crate) fn remove_where(&mut self, mut predicate: impl FnMut(&str, &E) -> bool) -> usize {
        let before = self.slots.len();
        self.slots.retain(|key, slot| !predicate(key, &slot.entry));
        let removed = before - self.slots.len();
        self.stats.invalidations += removed as u64;
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.slots.len(),
            ..self.stats
        }
    }

    /// Entries oldest first, for snapshots
    pub(crate) fn entries(&self) -> Vec<(&str, &E)> {
        let mut out: Vec<(&str, &Slot<E>)> =
            self.slots.iter().map(|(k, slot)| (k.as_str(), slot)).collect();
        out.sort_by_key(|(_, slot)| (slot.entry.timestamp(), slot.seq));
        out.into_iter().map(|(k, slot)| (k, &slot.entry)).collect()
    }
}

//! Cache Store Module
//!
//! Keyed result storage combining a HashMap with LRU tracking and expiry.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Cache Store ==
/// Result storage with optional LRU bound and optional max age.
///
/// LRU order is only maintained for bounded stores, so an unbounded store
/// costs a single hash lookup per access.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key-result storage
    entries: HashMap<K, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed, None = unbounded
    max_entries: Option<usize>,
    /// Lifetime applied to every stored result
    max_age: Option<Duration>,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore with optional capacity and lifetime.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of results held, None = unbounded
    /// * `max_age` - Lifetime of each result, None = never expires
    pub fn new(max_entries: Option<usize>, max_age: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            max_age,
        }
    }

    /// Creates an unbounded store whose entries never expire.
    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    // == Get ==
    /// Looks up a stored result, recording a hit or a miss.
    ///
    /// Expired entries are removed and count as a miss.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                if self.is_bounded() {
                    self.lru.touch(key);
                }
                return Some(value);
            }
            None => false,
        };

        if expired {
            self.discard(key);
            self.stats.record_expiration();
        }
        self.stats.record_miss();
        None
    }

    // == Insert ==
    /// Stores a result, overwriting any previous result for the key.
    ///
    /// If the store is at capacity, the least recently used entry is evicted.
    pub fn insert(&mut self, key: K, value: V) {
        let Some(max_entries) = self.max_entries else {
            self.entries.insert(key, CacheEntry::new(value, self.max_age));
            self.stats.set_total_entries(self.entries.len());
            return;
        };

        if max_entries == 0 {
            return;
        }

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= max_entries {
                match self.lru.evict_oldest() {
                    Some(evicted) => {
                        self.entries.remove(&evicted);
                        self.stats.record_eviction();
                        debug!("Evicted least recently used entry");
                    }
                    None => break,
                }
            }
        }

        self.entries
            .insert(key.clone(), CacheEntry::new(value, self.max_age));
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Contains ==
    /// Returns true if a live result is stored for `key`.
    ///
    /// Does not touch statistics or LRU order.
    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    // == Remove ==
    /// Removes the result for `key`. Returns true if one was stored.
    pub fn remove(&mut self, key: &K) -> bool {
        self.discard(key)
    }

    // == Clear ==
    /// Discards every stored result. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        if self.max_age.is_none() {
            return 0;
        }

        let now = Instant::now();
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.discard(&key);
            self.stats.record_expiration();
        }
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Counts a failed evaluation of the wrapped function.
    pub fn record_failure(&mut self) {
        self.stats.record_failure();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_bounded(&self) -> bool {
        self.max_entries.is_some()
    }

    fn discard(&mut self, key: &K) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            if self.is_bounded() {
                self.lru.remove(key);
            }
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }
}

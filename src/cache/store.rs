//! Cache Store Module
//!
//! Bounded key-to-entry map with TTL validity, lazy expiry on read, and a
//! periodic sweep that evicts oldest entries once over capacity.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};

// == Sweep Report ==
/// Counts of entries removed by a single sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries removed because their TTL elapsed
    pub expired: usize,
    /// Entries removed because the store was over capacity
    pub evicted: usize,
}

// == Cache Store ==
/// Bounded in-memory store mapping cache keys to TTL-stamped entries.
///
/// `set` never evicts: capacity is enforced by [`CacheStore::sweep`], which
/// the background cleanup task runs on an interval. The store may therefore
/// transiently hold more than `max_entries` between sweeps.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-to-entry storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Entry count the store is trimmed back to on sweep
    max_entries: usize,
    /// TTL applied to entries stored without an explicit TTL
    default_ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `max_entries` - Entry count the store is trimmed back to on sweep
    /// * `default_ttl` - TTL for entries stored without an explicit TTL
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
        }
    }

    // == Get ==
    /// Returns the payload stored under `key` if present and unexpired.
    ///
    /// Expired entries are removed on read and counted as a miss plus an
    /// expiration. Absent keys count as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.data.clone())
    }

    // == Set ==
    /// Stores `data` under `key`, overwriting any previous entry wholesale.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `data` - The payload to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    pub fn set(&mut self, key: String, data: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.insert(key, CacheEntry::new(data, ttl));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Clear ==
    /// Removes a single entry. Returns true if it existed.
    pub fn clear(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    /// Removes every entry.
    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    /// Removes all entries whose key matches `pattern`.
    ///
    /// A full scan over the keys; returns the number of entries removed.
    pub fn clear_matching(&mut self, pattern: &Regex) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.is_match(key));
        let removed = before - self.entries.len();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Sweep ==
    /// Deletes all expired entries, then evicts oldest-by-creation entries
    /// until the store is back at or under `max_entries`.
    ///
    /// The eviction pass sorts surviving entries by creation time, so a sweep
    /// is O(n log n) and runs only from the background cleanup task.
    pub fn sweep(&mut self) -> SweepReport {
        let now = Instant::now();

        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let expired = before - self.entries.len();
        self.stats.record_expirations(expired);

        let mut evicted = 0;
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            let mut by_age: Vec<(String, Instant)> = self
                .entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.created_at))
                .collect();
            by_age.sort_by_key(|(_, created_at)| *created_at);

            for (key, _) in by_age.into_iter().take(excess) {
                self.entries.remove(&key);
                evicted += 1;
            }
            self.stats.record_evictions(evicted);
        }

        self.stats.set_total_entries(self.entries.len());
        if expired > 0 || evicted > 0 {
            debug!(expired, evicted, remaining = self.entries.len(), "cache sweep");
        }

        SweepReport { expired, evicted }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry count the store is trimmed back to on sweep.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A single cache entry: payload plus creation and expiry timestamps.
///
/// Timestamps are monotonic instants, so paused test time stands in for a
/// wall clock in TTL tests.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored payload
    pub data: V,
    /// Creation time
    pub created_at: Instant,
    /// Expiration time (`created_at + ttl`)
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    pub fn new(data: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once the current time reaches
    /// the expiration time, so a read at exactly `created_at + ttl` misses.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Checks whether the entry has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Remaining TTL, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

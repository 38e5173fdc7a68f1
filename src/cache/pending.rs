//! Pending Request Registry
//!
//! Tracks in-flight operations by cache key so concurrent callers for the
//! same key share one underlying request instead of issuing duplicates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;

/// Future shared by every caller coalesced onto one in-flight operation.
///
/// The output is `Clone` (an `Arc`'d payload or a cloneable error), which is
/// what lets [`Shared`] hand the settled value to each joiner.
pub type SharedFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

/// One in-flight operation.
struct PendingRequest<V> {
    /// The shared future every joiner awaits
    future: SharedFetch<V>,
    /// When the operation was registered
    started_at: Instant,
    /// Registration stamp checked on release
    generation: u64,
}

// == Pending Registry ==
/// Key-to-in-flight-future map implementing request coalescing.
///
/// The check-then-register sequence runs under a single mutex acquisition:
/// the first caller to find no entry for a key becomes the sole executor for
/// that round, and every later caller joins its future until it settles or
/// the registration is reclaimed as stale. Entries carry a generation stamp
/// so a settle that races a reclamation cannot remove a newer registration
/// for the same key.
pub struct PendingRegistry<V> {
    /// In-flight operations by cache key
    inflight: Mutex<HashMap<String, PendingRequest<V>>>,
    /// Source of generation stamps
    next_generation: AtomicU64,
}

impl<V: Clone> PendingRegistry<V> {
    // == Constructor ==
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    // == Join Or Start ==
    /// Returns the pending future for `key`, creating one when absent.
    ///
    /// When an entry already exists its future is returned with
    /// `joined = true` and no new work is started. Otherwise `factory` is
    /// invoked with a fresh generation stamp (the future it builds must pass
    /// the stamp back to [`PendingRegistry::release`] when it settles), the
    /// future is registered, and `joined = false`.
    ///
    /// `factory` only constructs the future; nothing is polled under the lock.
    pub fn join_or_start<F>(&self, key: &str, factory: F) -> (SharedFetch<V>, bool)
    where
        F: FnOnce(u64) -> BoxFuture<'static, Result<V>>,
    {
        let mut inflight = self.inflight.lock().expect("pending registry lock poisoned");

        if let Some(pending) = inflight.get(key) {
            return (pending.future.clone(), true);
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let future = factory(generation).shared();
        inflight.insert(
            key.to_string(),
            PendingRequest {
                future: future.clone(),
                started_at: Instant::now(),
                generation,
            },
        );
        (future, false)
    }

    // == Release ==
    /// Removes the entry for `key` if its generation matches.
    ///
    /// Runs when an operation settles, success or failure, so a failed call
    /// never blocks retries for its key. The generation check keeps a
    /// reclaimed round's late settle from evicting the entry of a newer
    /// round started for the same key.
    pub fn release(&self, key: &str, generation: u64) {
        let mut inflight = self.inflight.lock().expect("pending registry lock poisoned");
        if inflight
            .get(key)
            .is_some_and(|pending| pending.generation == generation)
        {
            inflight.remove(key);
        }
    }

    // == Reclaim Stale ==
    /// Removes entries older than `max_age` regardless of settlement.
    ///
    /// Callers that already joined keep their shared future and still observe
    /// its eventual result; a new call for the key after reclamation starts
    /// an independent operation. The underlying request is not cancelled.
    pub fn reclaim_stale(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut inflight = self.inflight.lock().expect("pending registry lock poisoned");

        let before = inflight.len();
        inflight.retain(|_, pending| {
            now.saturating_duration_since(pending.started_at) < max_age
        });
        let reclaimed = before - inflight.len();

        if reclaimed > 0 {
            debug!(reclaimed, "reclaimed stale pending requests");
        }
        reclaimed
    }

    // == Clear ==
    /// Forgets every registration.
    pub fn clear(&self) {
        self.inflight
            .lock()
            .expect("pending registry lock poisoned")
            .clear();
    }

    // == Length ==
    /// Number of operations currently registered.
    pub fn len(&self) -> usize {
        self.inflight
            .lock()
            .expect("pending registry lock poisoned")
            .len()
    }

    /// Returns true if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for PendingRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

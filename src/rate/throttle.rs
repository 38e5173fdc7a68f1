//! Throttler
//!
//! Leading-edge rate control: at most one invocation per window; calls inside
//! an active window are dropped, not queued.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

// == Throttler ==
/// Invokes a callback at most once per `limit` window.
///
/// The first call in a window fires immediately and opens the window; calls
/// arriving before it closes are dropped, not queued. The callback's return
/// value is discarded.
pub struct Throttler<A> {
    /// Window length
    limit: Duration,
    /// The wrapped callback
    callback: Box<dyn Fn(A) + Send + Sync>,
    /// Start of the currently open window, if any
    last_fired: Mutex<Option<Instant>>,
}

impl<A> Throttler<A> {
    /// Creates a throttler around `callback`.
    pub fn new(limit: Duration, callback: impl Fn(A) + Send + Sync + 'static) -> Self {
        Self {
            limit,
            callback: Box::new(callback),
            last_fired: Mutex::new(None),
        }
    }

    // == Call ==
    /// Invokes the callback when no window is active; drops the call and
    /// returns false otherwise.
    pub fn call(&self, args: A) -> bool {
        let now = Instant::now();
        {
            let mut last_fired = self.last_fired.lock().expect("throttler lock poisoned");
            match *last_fired {
                Some(fired) if now.saturating_duration_since(fired) < self.limit => {
                    return false;
                }
                _ => *last_fired = Some(now),
            }
        }
        // Invoked outside the lock so a re-entrant callback cannot deadlock.
        (self.callback)(args);
        true
    }
}

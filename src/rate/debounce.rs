//! Debouncer
//!
//! Trailing-edge rate control: the wrapped callback runs only after a quiet
//! period, with the most recent call's arguments.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

// == Debouncer ==
/// Defers a callback until `wait` has elapsed with no further calls.
///
/// Every call cancels the previously scheduled invocation and schedules a new
/// one, so only the last call in a burst is delivered and only its arguments
/// survive. The callback's return value is discarded (fire-and-forget).
///
/// Clones share the same timer, so a clone's call resets the original's.
pub struct Debouncer<A> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    /// Quiet period before the callback fires
    wait: Duration,
    /// The wrapped callback
    callback: Box<dyn Fn(A) + Send + Sync>,
    /// Currently scheduled invocation, if any
    scheduled: Mutex<Option<JoinHandle<()>>>,
}

impl<A: Send + 'static> Debouncer<A> {
    /// Creates a debouncer around `callback`.
    pub fn new(wait: Duration, callback: impl Fn(A) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                wait,
                callback: Box::new(callback),
                scheduled: Mutex::new(None),
            }),
        }
    }

    // == Call ==
    /// Schedules `callback(args)` after the quiet period, cancelling any
    /// previously scheduled invocation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn call(&self, args: A) {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.wait).await;
            (inner.callback)(args);
        });

        let mut scheduled = self
            .inner
            .scheduled
            .lock()
            .expect("debouncer lock poisoned");
        if let Some(previous) = scheduled.replace(handle) {
            previous.abort();
        }
    }

    // == Cancel ==
    /// Cancels any pending invocation without running it.
    pub fn cancel(&self) {
        let mut scheduled = self
            .inner
            .scheduled
            .lock()
            .expect("debouncer lock poisoned");
        if let Some(handle) = scheduled.take() {
            handle.abort();
        }
    }
}

impl<A> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

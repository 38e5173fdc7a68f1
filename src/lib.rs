//! fetch-cache - An in-process request cache with request coalescing
//!
//! Sits between client code and an HTTP JSON API: deduplicates concurrent
//! identical requests onto one network operation, caches successful GET
//! responses with TTL expiry, and reclaims storage with a periodic background
//! sweep. Debounce and throttle utilities shape call volume upstream of the
//! cache.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod key;
pub mod models;
pub mod rate;
pub mod tasks;

pub use client::FetchCache;
pub use config::Config;
pub use error::{FetchError, Result};
pub use models::{BatchRequest, Exchange, FetchOptions, FetchResult, ResponseMeta};
pub use rate::{Debouncer, Throttler};
pub use tasks::spawn_cleanup_task;

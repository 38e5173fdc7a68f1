//! Client Module
//!
//! The cached HTTP client surface: single fetches, batched fetches, and
//! cache management operations.

mod batch;
mod executor;

pub use executor::FetchCache;

//! Batch Executor
//!
//! Fans out several keyed requests through the single-request cache and
//! coalescing path concurrently, preserving input order.

use futures::future::join_all;
use serde::de::DeserializeOwned;

use crate::client::FetchCache;
use crate::error::Result;
use crate::models::{BatchRequest, FetchResult};

impl FetchCache {
    // == Batch Fetch ==
    /// Issues every request concurrently through the cache and dedup path.
    ///
    /// Results come back in input order, one per request, each succeeding or
    /// failing independently. Requests inside one batch that share a cache
    /// key coalesce onto a single network operation via the pending registry.
    pub async fn batch_fetch<T: DeserializeOwned>(
        &self,
        requests: Vec<BatchRequest>,
    ) -> Vec<Result<FetchResult<T>>> {
        let futures = requests.into_iter().map(|request| async move {
            self.fetch::<T>(&request.url, request.options).await
        });
        join_all(futures).await
    }
}

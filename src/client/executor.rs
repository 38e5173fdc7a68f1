//! Request Executor
//!
//! Routes each request through the cache and the pending-request registry so
//! concurrent callers share one network operation, then performs the actual
//! HTTP call with reqwest.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use regex::Regex;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{CacheStats, CacheStore, PendingRegistry};
use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::key;
use crate::models::{Exchange, FetchOptions, FetchResult, ResponseMeta};
use crate::tasks;

// == Fetch Cache ==
/// Cached, coalescing HTTP JSON client.
///
/// One instance holds the cache store, the pending-request registry, and the
/// underlying reqwest client. Construct it once per process and share it;
/// clones are shallow and operate on the same state. Mutations elsewhere in
/// the application can bust entries through [`FetchCache::clear`],
/// [`FetchCache::clear_all`], and [`FetchCache::clear_matching`].
#[derive(Clone)]
pub struct FetchCache {
    /// Underlying HTTP client
    client: reqwest::Client,
    /// Shared response store
    store: Arc<RwLock<CacheStore<Arc<Exchange>>>>,
    /// In-flight request registry
    pending: Arc<PendingRegistry<Arc<Exchange>>>,
    /// Layer configuration
    config: Config,
}

impl FetchCache {
    // == Constructors ==
    /// Creates a fetch cache with its own reqwest client.
    ///
    /// The client applies `config.request_timeout` to every request unless a
    /// call overrides it.
    pub fn new(config: Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build reqwest client");
        Self::with_client(client, config)
    }

    /// Creates a fetch cache around an existing reqwest client.
    pub fn with_client(client: reqwest::Client, config: Config) -> Self {
        let store = CacheStore::new(config.max_entries, config.default_ttl);
        Self {
            client,
            store: Arc::new(RwLock::new(store)),
            pending: Arc::new(PendingRegistry::new()),
            config,
        }
    }

    // == Fetch ==
    /// Fetches `url`, serving from the cache or joining an in-flight request
    /// for the same key when possible.
    ///
    /// GET responses populate the cache on success; non-GET requests bypass
    /// the store entirely but still coalesce with identical concurrent calls.
    /// Errors propagate to every joined caller, are never cached, and never
    /// fall back to an expired entry.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<FetchResult<T>> {
        let cache_key = key::build_key(&options.method, url, options.body.as_ref(), &options.headers);
        let cacheable = options.is_cacheable();

        if cacheable {
            if let Some(exchange) = self.store.write().await.get(&cache_key) {
                debug!(key = %cache_key, "cache hit");
                return decode(&exchange, true);
            }
        }

        let (pending, joined) = self.pending.join_or_start(&cache_key, |generation| {
            let client = self.client.clone();
            let store = Arc::clone(&self.store);
            let registry = Arc::clone(&self.pending);
            let ttl = options.ttl;
            let key = cache_key.clone();
            let parts = RequestParts {
                method: options.method.clone(),
                url: url.to_string(),
                headers: options.headers.clone(),
                body: options.body.clone(),
                timeout: options.timeout,
            };

            async move {
                let outcome = execute(&client, parts).await;
                if cacheable {
                    if let Ok(exchange) = &outcome {
                        store.write().await.set(key.clone(), Arc::clone(exchange), ttl);
                    }
                }
                // Runs on success and failure alike, so a failed round never
                // blocks retries for this key.
                registry.release(&key, generation);
                outcome
            }
            .boxed()
        });
        if joined {
            debug!(key = %cache_key, "joined in-flight request");
        }

        let exchange = pending.await?;
        decode(&exchange, false)
    }

    // == Cache Management ==
    /// Removes the cache entry for `key`. Returns true if it existed.
    ///
    /// Keys come from [`crate::key::build_key`].
    pub async fn clear(&self, key: &str) -> bool {
        self.store.write().await.clear(key)
    }

    /// Empties the cache and forgets every pending registration.
    ///
    /// Callers already joined on a pending request keep their shared future;
    /// the next call for any key starts fresh.
    pub async fn clear_all(&self) {
        self.store.write().await.clear_all();
        self.pending.clear();
    }

    /// Removes every cache entry whose key matches `pattern`.
    ///
    /// Returns the number of entries removed.
    pub async fn clear_matching(&self, pattern: &Regex) -> usize {
        self.store.write().await.clear_matching(pattern)
    }

    // == Introspection ==
    /// Snapshot of cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Number of entries currently stored.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// Number of requests currently in flight.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // == Cleanup Task ==
    /// Starts the background cleanup task for this instance.
    ///
    /// Nothing is spawned implicitly; abort the returned handle to stop the
    /// task during shutdown.
    pub fn spawn_cleanup_task(&self) -> JoinHandle<()> {
        tasks::spawn_cleanup_task(
            Arc::clone(&self.store),
            Arc::clone(&self.pending),
            self.config.sweep_interval,
            self.config.pending_max_age,
        )
    }

    /// Access to the shared store, for tests and advanced integrations.
    #[cfg(test)]
    pub(crate) fn store(&self) -> Arc<RwLock<CacheStore<Arc<Exchange>>>> {
        Arc::clone(&self.store)
    }
}

/// Owned pieces of one outgoing request.
struct RequestParts {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    timeout: Option<Duration>,
}

// == Execute ==
/// Performs the HTTP call and parses the JSON body.
async fn execute(client: &reqwest::Client, parts: RequestParts) -> Result<Arc<Exchange>> {
    let mut request = client.request(parts.method, &parts.url);
    for (name, value) in &parts.headers {
        request = request.header(name, value);
    }
    if let Some(body) = &parts.body {
        request = request.json(body);
    }
    if let Some(timeout) = parts.timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await.map_err(|e| FetchError::Network {
        url: parts.url.clone(),
        message: e.to_string(),
    })?;

    let status = response.status();
    let status_text = status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string();

    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
            status_text,
            url: parts.url.clone(),
        });
    }

    let meta = ResponseMeta {
        status: status.as_u16(),
        status_text,
        url: parts.url.clone(),
    };

    let body: Value = response.json().await.map_err(|e| {
        if e.is_decode() {
            FetchError::Serialization {
                url: parts.url.clone(),
                message: e.to_string(),
            }
        } else {
            FetchError::Network {
                url: parts.url.clone(),
                message: e.to_string(),
            }
        }
    })?;

    Ok(Arc::new(Exchange { body, meta }))
}

// == Decode ==
/// Deserializes a cached or fresh exchange into the caller's type.
fn decode<T: DeserializeOwned>(exchange: &Exchange, from_cache: bool) -> Result<FetchResult<T>> {
    let data = serde_json::from_value(exchange.body.clone()).map_err(|e| {
        FetchError::Serialization {
            url: exchange.meta.url.clone(),
            message: e.to_string(),
        }
    })?;

    Ok(FetchResult {
        data,
        response: exchange.meta.clone(),
        from_cache,
    })
}

//! Request Options
//!
//! Describes a single cacheable request and the per-call knobs callers can set.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

// == Fetch Options ==
/// Per-request options for a cached fetch.
///
/// Defaults to a plain GET with no headers, no body, the configured default
/// TTL, and the configured request timeout.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// HTTP method (GET by default)
    pub method: Method,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Optional JSON request body
    pub body: Option<Value>,
    /// Per-entry TTL, overriding the configured default
    pub ttl: Option<Duration>,
    /// Per-request timeout, overriding the client-wide default
    pub timeout: Option<Duration>,
}

impl FetchOptions {
    /// Options for a plain GET request.
    pub fn get() -> Self {
        Self::default()
    }

    /// Options for a POST request carrying `body`.
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    /// Sets the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Appends a header pair.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the TTL for the cache entry this request may create.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether responses to this request may be stored in the cache.
    ///
    /// Only GET responses are cached; every other method bypasses the store
    /// (though identical concurrent calls still coalesce).
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET
    }
}

// == Batch Request ==
/// One element of a batched fetch: a URL plus its options.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Full request URL
    pub url: String,
    /// Options for this element
    pub options: FetchOptions,
}

impl BatchRequest {
    /// A plain GET batch element.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            options: FetchOptions::default(),
        }
    }

    /// Replaces the element's options.
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }
}

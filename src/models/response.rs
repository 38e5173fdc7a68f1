//! Response Types
//!
//! Metadata and typed results returned by cached fetch operations.

use serde_json::Value;

// == Response Meta ==
/// Metadata of the HTTP response that produced a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: u16,
    /// Canonical status text
    pub status_text: String,
    /// URL the response came from
    pub url: String,
}

// == Exchange ==
/// One completed HTTP exchange: the parsed JSON body plus response metadata.
///
/// Cached behind an `Arc` so cache hits and coalesced callers share a single
/// allocation; a refetch replaces the whole exchange, never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// Parsed response body
    pub body: Value,
    /// Response metadata
    pub meta: ResponseMeta,
}

// == Fetch Result ==
/// Typed result of a cached fetch.
#[derive(Debug, Clone)]
pub struct FetchResult<T> {
    /// Deserialized payload
    pub data: T,
    /// Metadata of the underlying response
    pub response: ResponseMeta,
    /// Whether the payload was served from the cache without a network call
    pub from_cache: bool,
}

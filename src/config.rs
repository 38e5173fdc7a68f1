//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cache layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache retains after a sweep
    pub max_entries: usize,
    /// Default TTL for entries stored without an explicit TTL
    pub default_ttl: Duration,
    /// Interval between background sweep runs
    pub sweep_interval: Duration,
    /// Age past which an unsettled pending request is reclaimed
    pub pending_max_age: Duration,
    /// Timeout applied to every outgoing request unless overridden per call
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FETCH_CACHE_MAX_ENTRIES` - Maximum cache entries (default: 200)
    /// - `FETCH_CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `FETCH_CACHE_SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 60000)
    /// - `FETCH_CACHE_PENDING_MAX_AGE_MS` - Stale pending cutoff in milliseconds (default: 30000)
    /// - `FETCH_CACHE_REQUEST_TIMEOUT_MS` - Outgoing request timeout in milliseconds (default: 30000)
    pub fn from_env() -> Self {
        Self {
            max_entries: env_or("FETCH_CACHE_MAX_ENTRIES", 200),
            default_ttl: Duration::from_millis(env_or("FETCH_CACHE_DEFAULT_TTL_MS", 300_000)),
            sweep_interval: Duration::from_millis(env_or("FETCH_CACHE_SWEEP_INTERVAL_MS", 60_000)),
            pending_max_age: Duration::from_millis(env_or("FETCH_CACHE_PENDING_MAX_AGE_MS", 30_000)),
            request_timeout: Duration::from_millis(env_or("FETCH_CACHE_REQUEST_TIMEOUT_MS", 30_000)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 200,
            default_ttl: Duration::from_millis(300_000),
            sweep_interval: Duration::from_millis(60_000),
            pending_max_age: Duration::from_millis(30_000),
            request_timeout: Duration::from_millis(30_000),
        }
    }
}

/// Reads an environment variable, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

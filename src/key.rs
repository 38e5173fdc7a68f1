//! Cache Key Module
//!
//! Derives a deterministic string key from the identifying parts of a request.

use reqwest::Method;
use serde_json::Value;

// == Key Builder ==
/// Builds the canonical cache key for a request.
///
/// The key starts with `METHOD:url` and is extended with the serialized body
/// and headers when present. Serialization is canonical: JSON object keys
/// serialize in sorted order (serde_json's default map ordering) and headers
/// are lowercased and sorted by name, so two requests that differ only in
/// header order or body key order share a key. Requests that differ in any
/// byte of the canonical form get distinct keys.
///
/// The readable `METHOD:url` prefix is what makes pattern-based invalidation
/// (`^GET:https://api\.example\.com/users`) work.
///
/// # Arguments
/// * `method` - HTTP method of the request
/// * `url` - Full request URL
/// * `body` - Optional JSON body
/// * `headers` - Header name/value pairs in caller order
pub fn build_key(
    method: &Method,
    url: &str,
    body: Option<&Value>,
    headers: &[(String, String)],
) -> String {
    let mut key = format!("{}:{}", method.as_str(), url);

    if let Some(body) = body {
        key.push(':');
        key.push_str(&body.to_string());
    }

    if !headers.is_empty() {
        let mut sorted: Vec<(String, &str)> = headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
            .collect();
        sorted.sort();

        key.push(':');
        for (i, (name, value)) in sorted.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
    }

    key
}

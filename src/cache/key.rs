//! Canonical cache key generation.

use std::collections::BTreeMap;

use serde_json::Value;

/// Derive the canonical cache key for a URL and its request params.
///
/// Params are serialized in lexicographic key order as `key=JSON(value)`
/// pairs joined with `&` and appended after `?`, so `{a:1, b:2}` and
/// `{b:2, a:1}` address the same entry. An empty map yields the URL
/// unchanged. The function is pure; it never consults cache state.
pub fn generate_key(url: &str, params: &BTreeMap<String, Value>) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let suffix = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", url, suffix)
}

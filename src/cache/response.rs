//! In-memory response cache with combined LRU + TTL eviction.
//!
//! # Responsibilities
//! - Bound the number of live entries (`max_entries`)
//! - Expire entries lazily on read, eagerly via `evict_expired`
//! - Evict the least recently used entry when a new key overflows capacity
//!
//! # Design Decisions
//! - Entry map and access-order map are mutated under one lock so they
//!   stay in one-to-one correspondence
//! - Entries are replaced whole, never patched in place
//! - Zero TTL is a valid value that expires on the next read, not an error

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::observability::metrics;

/// A single cached payload with its expiry and revalidation metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    cached_at: Instant,
    ttl: Duration,
    etag: Option<String>,
    last_modified: Option<String>,
}

impl<V> CacheEntry<V> {
    /// The cached payload.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// `ETag` response header captured at store time, for revalidation.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// `Last-Modified` response header captured at store time.
    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    /// Time elapsed since the entry was stored.
    pub fn age(&self) -> Duration {
        self.cached_at.elapsed()
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.cached_at) > self.ttl
    }
}

/// Point-in-time view of cache occupancy.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub keys: Vec<String>,
}

/// Bounded key→value store with per-entry TTL and LRU eviction.
///
/// The payload type is opaque to the cache; the request pipeline stores
/// decoded bodies, tests store plain strings. `get` clones the payload
/// out, so concurrent readers never observe a partially written entry.
#[derive(Debug)]
pub struct ResponseCache<V> {
    inner: Mutex<CacheInner<V>>,
    max_entries: usize,
    default_ttl: Duration,
}

#[derive(Debug)]
struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    access_order: HashMap<String, u64>,
    access_counter: u64,
}

impl<V> CacheInner<V> {
    /// Record an access, ranking `key` as most recently used.
    fn touch(&mut self, key: &str) {
        self.access_counter += 1;
        self.access_order.insert(key.to_string(), self.access_counter);
    }

    /// Remove an entry together with its access-order record.
    fn remove_entry(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        self.access_order.remove(key);
        existed
    }

    /// Key with the smallest access counter. Ties cannot occur because the
    /// counter is strictly increasing per access.
    fn lru_key(&self) -> Option<String> {
        self.access_order
            .iter()
            .min_by_key(|(_, counter)| **counter)
            .map(|(key, _)| key.clone())
    }
}

impl<V: Clone> ResponseCache<V> {
    /// Create a cache holding at most `max_entries` entries, each living
    /// `default_ttl` unless a `set` call overrides it.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                access_order: HashMap::new(),
                access_counter: 0,
            }),
            max_entries,
            default_ttl,
        }
    }

    /// Look up a live entry, touching its access order.
    ///
    /// An expired entry is removed on the spot and reported as absent;
    /// absence is the only "not found" signal.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let now = Instant::now();

        let expired = matches!(inner.entries.get(key), Some(entry) if entry.is_expired(now));
        if expired {
            inner.remove_entry(key);
            metrics::record_cache_size(inner.entries.len());
        }

        let value = if expired {
            None
        } else if let Some(entry) = inner.entries.get(key) {
            Some(entry.value.clone())
        } else {
            None
        };

        match value {
            Some(value) => {
                inner.touch(key);
                metrics::record_cache_hit();
                Some(value)
            }
            None => {
                metrics::record_cache_miss();
                None
            }
        }
    }

    /// Insert or replace an entry.
    ///
    /// Inserting a brand-new key while at capacity first evicts the least
    /// recently used entry; overwriting an existing key never evicts
    /// another key.
    pub fn set(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
        etag: Option<String>,
        last_modified: Option<String>,
    ) {
        let mut inner = self.lock();

        let is_new = !inner.entries.contains_key(key);
        if is_new && inner.entries.len() >= self.max_entries {
            if let Some(victim) = inner.lru_key() {
                inner.remove_entry(&victim);
                metrics::record_cache_eviction();
                tracing::debug!(key = %victim, "evicted least recently used cache entry");
            }
        }

        let entry = CacheEntry {
            value,
            cached_at: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
            etag,
            last_modified,
        };
        inner.entries.insert(key.to_string(), entry);
        inner.touch(key);
        metrics::record_cache_size(inner.entries.len());
    }

    /// Whether a live entry exists, with the same expiry side effects as
    /// [`ResponseCache::get`].
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove an entry; returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.lock();
        let existed = inner.remove_entry(key);
        metrics::record_cache_size(inner.entries.len());
        existed
    }

    /// Drop all entries and restart the access counter.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.access_order.clear();
        inner.access_counter = 0;
        metrics::record_cache_size(0);
    }

    /// Eagerly sweep every expired entry; returns the number removed.
    ///
    /// Intended for periodic maintenance outside the request path; the
    /// request path relies on lazy expiry in `get`.
    pub fn evict_expired(&self) -> usize {
        let mut inner = self.lock();
        let now = Instant::now();

        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.remove_entry(key);
        }
        metrics::record_cache_size(inner.entries.len());
        expired.len()
    }

    /// Occupancy snapshot. No side effects.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            size: inner.entries.len(),
            max_entries: self.max_entries,
            keys: inner.entries.keys().cloned().collect(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<V>> {
        self.inner.lock().expect("response cache mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3_600);

    fn set(cache: &ResponseCache<String>, key: &str, value: &str) {
        cache.set(key, value.to_string(), None, None, None);
    }

    #[test]
    fn test_basic_set_get_delete() {
        let cache = ResponseCache::new(10, HOUR);

        assert!(cache.get("a").is_none());
        set(&cache, "a", "one");
        assert_eq!(cache.get("a").as_deref(), Some("one"));
        assert!(cache.has("a"));

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_lru_eviction_keeps_most_recent_inserts() {
        let cache = ResponseCache::new(3, HOUR);
        for key in ["a", "b", "c", "d", "e"] {
            set(&cache, key, key);
        }

        let stats = cache.stats();
        assert_eq!(stats.size, 3);
        let mut keys = stats.keys;
        keys.sort();
        assert_eq!(keys, vec!["c", "d", "e"]);
    }

    #[test]
    fn test_get_protects_entry_from_eviction() {
        let cache = ResponseCache::new(2, HOUR);
        set(&cache, "a", "one");
        set(&cache, "b", "two");

        // Touch "a" so "b" becomes the LRU victim.
        assert!(cache.get("a").is_some());
        set(&cache, "c", "three");

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict_other_keys() {
        let cache = ResponseCache::new(2, HOUR);
        set(&cache, "a", "one");
        set(&cache, "b", "two");

        set(&cache, "a", "uno");

        assert_eq!(cache.stats().size, 2);
        assert_eq!(cache.get("a").as_deref(), Some("uno"));
        assert_eq!(cache.get("b").as_deref(), Some("two"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_boundary() {
        let cache = ResponseCache::new(10, HOUR);
        cache.set("a", "one".to_string(), Some(Duration::from_millis(1_000)), None, None);

        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(cache.get("a").as_deref(), Some("one"));

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(cache.get("a").is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_expires_on_next_read() {
        let cache = ResponseCache::new(10, HOUR);
        cache.set("a", "one".to_string(), Some(Duration::ZERO), None, None);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("a").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_expired_sweeps_only_expired() {
        let cache = ResponseCache::new(10, HOUR);
        cache.set("old", "x".to_string(), Some(Duration::from_millis(10)), None, None);
        cache.set("fresh", "y".to_string(), Some(Duration::from_millis(10_000)), None, None);

        tokio::time::advance(Duration::from_millis(100)).await;

        assert_eq!(cache.evict_expired(), 1);
        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.keys, vec!["fresh".to_string()]);
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = ResponseCache::new(10, HOUR);
        set(&cache, "a", "one");
        set(&cache, "b", "two");

        cache.clear();

        assert_eq!(cache.stats().size, 0);
        assert!(cache.get("a").is_none());
    }
}

//! Metrics recording helpers.
//!
//! Thin wrappers over the `metrics` facade. The library only records;
//! hosts install whatever recorder they expose (Prometheus, statsd, ...).
//! Without a recorder these are no-ops.

use metrics::{counter, gauge, histogram};

pub fn record_cache_hit() {
    counter!("tabfetch_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("tabfetch_cache_misses_total").increment(1);
}

pub fn record_cache_eviction() {
    counter!("tabfetch_cache_evictions_total").increment(1);
}

pub fn record_cache_size(size: usize) {
    gauge!("tabfetch_cache_entries").set(size as f64);
}

/// A caller queued on the rate limiter instead of being admitted at once.
pub fn record_rate_limit_wait() {
    counter!("tabfetch_rate_limited_total").increment(1);
}

pub fn record_retry() {
    counter!("tabfetch_retries_total").increment(1);
}

/// Outcome is one of `ok`, `cache_hit`, `error`.
pub fn record_request(outcome: &'static str) {
    counter!("tabfetch_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_request_duration(seconds: f64) {
    histogram!("tabfetch_request_duration_seconds").record(seconds);
}

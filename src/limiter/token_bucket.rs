//! Token-bucket request throttling.
//!
//! # Responsibilities
//! - Admit one request per token, suspending callers while the bucket is dry
//! - Refill lazily from elapsed time on every access (no background timer)
//! - Serve queued callers in enqueue order, re-validating on wake
//!
//! # Design Decisions
//! - Tokens are recomputed before every read or decrement and capped at
//!   capacity, so burst accumulation is bounded
//! - A woken waiter re-attempts acquisition instead of assuming a token
//!   was reserved for it; losers of the race re-queue with a fresh wait
//! - `reset()` refills the bucket and wakes all waiters against the new
//!   state; none of them are failed
//! - Dropping a suspended `acquire()` future removes the caller from the
//!   wait queue, which is how per-request cancellation reaches the queue

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::observability::metrics;

/// Point-in-time view of limiter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterStats {
    pub available_tokens: u32,
    pub max_tokens: u32,
    pub queue_length: usize,
}

/// Token-bucket admission gate with a FIFO wait queue.
///
/// `acquire` never times out or errors on its own; callers that need a
/// bounded wait impose their own cancellation around it.
#[derive(Debug)]
pub struct RateLimiter {
    max_tokens: u32,
    refill_rate_per_ms: f64,
    state: Mutex<BucketState>,
    reset_event: Notify,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    queue_len: usize,
    generation: u64,
}

impl RateLimiter {
    /// Create a bucket granting `max_requests` tokens per `interval`.
    pub fn new(max_requests: u32, interval: Duration) -> Self {
        let interval_ms = (interval.as_millis() as f64).max(1.0);
        Self {
            max_tokens: max_requests,
            refill_rate_per_ms: f64::from(max_requests) / interval_ms,
            state: Mutex::new(BucketState {
                tokens: f64::from(max_requests),
                last_refill: Instant::now(),
                queue_len: 0,
                generation: 0,
            }),
            reset_event: Notify::new(),
        }
    }

    /// Suspend until a token is granted, then consume it.
    ///
    /// If the bucket is dry, the caller queues with a wake timer of
    /// `ceil((1 - tokens) / rate_per_ms)` milliseconds and re-attempts on
    /// wake. Concurrent waiters may race on wake; at most one token is
    /// consumed per successful return.
    pub async fn acquire(&self) {
        loop {
            let (wait, generation) = {
                let mut state = self.lock();
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                (Self::wait_for_next_token(&state, self.refill_rate_per_ms), state.generation)
            };

            let _queued = QueueGuard::register(self, generation);
            metrics::record_rate_limit_wait();
            tracing::trace!(wait_ms = wait.as_millis() as u64, "waiting for rate limit token");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.reset_event.notified() => {}
            }
        }
    }

    /// Refill lazily, then report whole available tokens.
    pub fn available_tokens(&self) -> u32 {
        let mut state = self.lock();
        self.refill(&mut state);
        state.tokens.floor() as u32
    }

    /// Zero if a token is available now, otherwise the wait until the next
    /// token materializes.
    pub fn time_until_next_token(&self) -> Duration {
        let mut state = self.lock();
        self.refill(&mut state);
        Self::wait_for_next_token(&state, self.refill_rate_per_ms)
    }

    /// Restore a full bucket and wake every queued waiter.
    ///
    /// Woken waiters re-attempt against the fresh state rather than being
    /// failed; the queue length reads zero from the moment this returns.
    pub fn reset(&self) {
        {
            let mut state = self.lock();
            state.tokens = f64::from(self.max_tokens);
            state.last_refill = Instant::now();
            state.queue_len = 0;
            state.generation += 1;
        }
        self.reset_event.notify_waiters();
        tracing::debug!("rate limiter reset to full capacity");
    }

    /// Snapshot of bucket and queue state.
    pub fn stats(&self) -> RateLimiterStats {
        let mut state = self.lock();
        self.refill(&mut state);
        RateLimiterStats {
            available_tokens: state.tokens.floor() as u32,
            max_tokens: self.max_tokens,
            queue_length: state.queue_len,
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(state.last_refill).as_secs_f64() * 1_000.0;
        state.tokens =
            (state.tokens + elapsed_ms * self.refill_rate_per_ms).min(f64::from(self.max_tokens));
        state.last_refill = now;
    }

    fn wait_for_next_token(state: &BucketState, rate_per_ms: f64) -> Duration {
        if state.tokens >= 1.0 {
            return Duration::ZERO;
        }
        let deficit = 1.0 - state.tokens;
        Duration::from_millis((deficit / rate_per_ms).ceil() as u64)
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().expect("rate limiter mutex poisoned")
    }
}

/// Queue membership for one suspended waiter. Deregisters on drop so a
/// cancelled waiter leaves the queue immediately; the generation check
/// keeps a late drop from decrementing a queue that `reset` already
/// cleared.
struct QueueGuard<'a> {
    limiter: &'a RateLimiter,
    generation: u64,
}

impl<'a> QueueGuard<'a> {
    fn register(limiter: &'a RateLimiter, generation: u64) -> Self {
        let mut state = limiter.lock();
        if state.generation == generation {
            state.queue_len += 1;
        }
        Self { limiter, generation }
    }
}

impl Drop for QueueGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.limiter.lock();
        if state.generation == self.generation && state.queue_len > 0 {
            state.queue_len -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_sequential_acquires_conserve_tokens() {
        let limiter = RateLimiter::new(10, Duration::from_millis(1_000));

        for consumed in 1..=5u32 {
            limiter.acquire().await;
            assert_eq!(limiter.available_tokens(), 10 - consumed);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_grants_one_token_per_slice() {
        let limiter = RateLimiter::new(10, Duration::from_millis(1_000));
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.available_tokens(), 0);

        // interval / max_requests = 100 ms per token.
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(limiter.available_tokens(), 1);

        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(limiter.available_tokens(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_caps_at_capacity() {
        let limiter = RateLimiter::new(5, Duration::from_millis(1_000));
        limiter.acquire().await;

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(limiter.available_tokens(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_refill() {
        let limiter = RateLimiter::new(2, Duration::from_millis(1_000));
        limiter.acquire().await;
        limiter.acquire().await;

        let started = Instant::now();
        limiter.acquire().await;

        // One token costs interval / max_requests = 500 ms.
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_until_next_token() {
        let limiter = RateLimiter::new(2, Duration::from_millis(1_000));
        assert_eq!(limiter.time_until_next_token(), Duration::ZERO);

        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(limiter.time_until_next_token(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restores_capacity_and_clears_queue() {
        let limiter = Arc::new(RateLimiter::new(2, Duration::from_millis(1_000)));
        limiter.acquire().await;
        limiter.acquire().await;

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            waiters.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        tokio::task::yield_now().await;
        assert_eq!(limiter.stats().queue_length, 3);

        limiter.reset();
        let stats = limiter.stats();
        assert_eq!(stats.available_tokens, 2);
        assert_eq!(stats.queue_length, 0);

        // Woken waiters drain against the fresh bucket: two immediately,
        // the third after one more refill slice.
        for waiter in waiters {
            waiter.await.unwrap();
        }
        assert_eq!(limiter.stats().queue_length, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waiter_leaves_queue() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_millis(60_000)));
        limiter.acquire().await;

        let waiter = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::task::yield_now().await;
        assert_eq!(limiter.stats().queue_length, 1);

        waiter.abort();
        let _ = waiter.await;
        assert_eq!(limiter.stats().queue_length, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_waiters_drain_one_per_refill_slice() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_millis(100)));
        limiter.acquire().await;

        let started = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Three queued callers need three refill slices; losers of a wake
        // race re-queue rather than stealing a second token.
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(limiter.stats().queue_length, 0);
    }
}

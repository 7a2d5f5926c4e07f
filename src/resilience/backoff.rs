//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Calculate the delay before retry `attempt` (1-based).
///
/// The delay doubles from `base` per attempt, is capped at `max`, and
/// carries 0-10% jitter so simultaneous retries spread apart.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponent = 2u32.saturating_pow(attempt - 1);
    let delay = base.saturating_mul(exponent).min(max);

    let jitter_range = delay.as_millis() as u64 / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    delay + Duration::from_millis(jitter)
}

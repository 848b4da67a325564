//! Retry policy: per-key counters with per-key caps.

use taxi_domain::config::RetryConfig;
use taxi_domain::slots::{RetryCounters, RetryKey};

/// Result of incrementing a retry counter against its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Still within the cap; carries the new count.
    Within(u32),
    /// The increment pushed the counter past its cap.
    Exceeded,
}

/// Increment the counter for `key` and compare against its configured cap.
pub fn increment(counters: &mut RetryCounters, config: &RetryConfig, key: RetryKey) -> RetryOutcome {
    let count = counters.increment(key);
    let cap = config.cap(key);
    if count > cap {
        RetryOutcome::Exceeded
    } else {
        RetryOutcome::Within(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_cap() {
        let config = RetryConfig::default();
        let mut counters = RetryCounters::default();
        // max_confirm_retries defaults to 2.
        assert_eq!(
            increment(&mut counters, &config, RetryKey::Confirm),
            RetryOutcome::Within(1)
        );
        assert_eq!(
            increment(&mut counters, &config, RetryKey::Confirm),
            RetryOutcome::Within(2)
        );
    }

    #[test]
    fn exceeds_cap_on_next_increment() {
        let config = RetryConfig::default();
        let mut counters = RetryCounters::default();
        increment(&mut counters, &config, RetryKey::Confirm);
        increment(&mut counters, &config, RetryKey::Confirm);
        assert_eq!(
            increment(&mut counters, &config, RetryKey::Confirm),
            RetryOutcome::Exceeded
        );
    }

    #[test]
    fn reset_clears_counter() {
        let config = RetryConfig::default();
        let mut counters = RetryCounters::default();
        increment(&mut counters, &config, RetryKey::Pickup);
        counters.reset(RetryKey::Pickup);
        assert_eq!(
            increment(&mut counters, &config, RetryKey::Pickup),
            RetryOutcome::Within(1)
        );
    }
}

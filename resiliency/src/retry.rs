//! Retry backoff arithmetic
//!
//! Only transient failures are retried; classification happens in the
//! executor. Fixed-delay by default, exponential with a cap on request.

use crate::policy::{BackoffStrategy, RetryConfig};
use std::time::Duration;

/// Wait before the given attempt (1-based; attempt 1 is the first retry)
pub fn wait_before_attempt(config: &RetryConfig, attempt: u32) -> Duration {
    match &config.backoff {
        BackoffStrategy::Fixed => Duration::from_millis(config.wait_millis),
        BackoffStrategy::Exponential { multiplier, cap_millis } => {
            let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
            let millis = (config.wait_millis as f64 * factor).round() as u64;
            Duration::from_millis(millis.min(*cap_millis))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay() {
        let config = RetryConfig {
            max_attempts: 3,
            wait_millis: 500,
            backoff: BackoffStrategy::Fixed,
        };
        assert_eq!(wait_before_attempt(&config, 1), Duration::from_millis(500));
        assert_eq!(wait_before_attempt(&config, 5), Duration::from_millis(500));
    }

    #[test]
    fn test_exponential_with_cap() {
        let config = RetryConfig {
            max_attempts: 5,
            wait_millis: 100,
            backoff: BackoffStrategy::Exponential {
                multiplier: 2.0,
                cap_millis: 500,
            },
        };
        assert_eq!(wait_before_attempt(&config, 1), Duration::from_millis(100));
        assert_eq!(wait_before_attempt(&config, 2), Duration::from_millis(200));
        assert_eq!(wait_before_attempt(&config, 3), Duration::from_millis(400));
        // Capped from 800
        assert_eq!(wait_before_attempt(&config, 4), Duration::from_millis(500));
    }
}

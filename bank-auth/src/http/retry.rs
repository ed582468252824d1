//! Backoff for idempotent data calls.

use std::time::{Duration, SystemTime};

use reqwest_retry::{RetryDecision, RetryPolicy};

const FIRST_DELAY: Duration = Duration::from_millis(200);
const LONGEST_DELAY: Duration = Duration::from_secs(2);

/// Doubling backoff bounded both by a retry count and by a wall-clock window.
///
/// The window is `timeout * (max_retries + 1)`, so a caller never waits much longer
/// than every attempt timing out back to back would take.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    max_retries: u32,
    window: Duration,
}

impl BackoffPolicy {
    pub fn new(max_retries: u32, timeout: Duration) -> Self {
        Self {
            max_retries,
            window: timeout.saturating_mul(max_retries.saturating_add(1)),
        }
    }

    fn delay(&self, past_retries: u32) -> Duration {
        FIRST_DELAY
            .saturating_mul(1 << past_retries.min(16))
            .min(LONGEST_DELAY)
    }
}

impl RetryPolicy for BackoffPolicy {
    fn should_retry(&self, request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        if n_past_retries >= self.max_retries {
            return RetryDecision::DoNotRetry;
        }

        let delay = self.delay(n_past_retries);
        let elapsed = request_start_time.elapsed().unwrap_or_default();
        if elapsed + delay > self.window {
            return RetryDecision::DoNotRetry;
        }

        RetryDecision::Retry {
            execute_after: SystemTime::now() + delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_up_to_the_cap() {
        let policy = BackoffPolicy::new(5, Duration::from_secs(10));

        assert_eq!(policy.delay(0), Duration::from_millis(200));
        assert_eq!(policy.delay(1), Duration::from_millis(400));
        assert_eq!(policy.delay(3), Duration::from_millis(1600));
        assert_eq!(policy.delay(4), LONGEST_DELAY);
        assert_eq!(policy.delay(40), LONGEST_DELAY);
    }

    #[test]
    fn test_stops_after_max_retries() {
        let policy = BackoffPolicy::new(2, Duration::from_secs(10));
        let start = SystemTime::now();

        assert!(matches!(policy.should_retry(start, 1), RetryDecision::Retry { .. }));
        assert!(matches!(policy.should_retry(start, 2), RetryDecision::DoNotRetry));
    }

    #[test]
    fn test_stops_once_the_window_is_spent() {
        let policy = BackoffPolicy::new(2, Duration::from_secs(1));
        let long_ago = SystemTime::now() - Duration::from_secs(5);

        assert!(matches!(policy.should_retry(long_ago, 0), RetryDecision::DoNotRetry));
    }
}

//! Retry policy for failed polls
//!
//! The decision depends only on the error class, so the same error repeated
//! any number of times always gets the same treatment.

use std::time::Duration;
use tether_client::ErrorClass;

/// What the poller does before its next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Poll again right away
    Immediate,
    /// Sleep for the given delay, then poll again
    Backoff(Duration),
}

impl RetryDecision {
    pub fn delay(self) -> Duration {
        match self {
            Self::Immediate => Duration::ZERO,
            Self::Backoff(delay) => delay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff_interval: Duration,
}

impl RetryPolicy {
    pub fn new(backoff_interval: Duration) -> Self {
        Self { backoff_interval }
    }

    pub fn decide(&self, class: ErrorClass) -> RetryDecision {
        match class {
            ErrorClass::Unavailable | ErrorClass::ResourceExhausted | ErrorClass::Internal => {
                RetryDecision::Backoff(self.backoff_interval)
            }
            // A timed out long-poll just means there was no work
            ErrorClass::DeadlineExceeded => RetryDecision::Immediate,
            ErrorClass::Cancelled | ErrorClass::Other => RetryDecision::Immediate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_side_failures_back_off() {
        let policy = RetryPolicy::new(Duration::from_secs(5));

        for class in [
            ErrorClass::Unavailable,
            ErrorClass::ResourceExhausted,
            ErrorClass::Internal,
        ] {
            assert_eq!(
                policy.decide(class),
                RetryDecision::Backoff(Duration::from_secs(5))
            );
        }
    }

    #[test]
    fn test_timeouts_cancellations_and_others_retry_immediately() {
        let policy = RetryPolicy::new(Duration::from_secs(5));

        for class in [
            ErrorClass::DeadlineExceeded,
            ErrorClass::Cancelled,
            ErrorClass::Other,
        ] {
            assert_eq!(policy.decide(class), RetryDecision::Immediate);
            assert_eq!(policy.decide(class).delay(), Duration::ZERO);
        }
    }

    #[test]
    fn test_repeated_errors_get_the_same_decision() {
        let policy = RetryPolicy::new(Duration::from_millis(250));
        let decisions: Vec<_> = (0..10)
            .map(|_| policy.decide(ErrorClass::Unavailable))
            .collect();

        assert!(
            decisions
                .iter()
                .all(|d| *d == RetryDecision::Backoff(Duration::from_millis(250)))
        );
    }
}

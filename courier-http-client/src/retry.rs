//! Retry policy for the send pipeline.

use std::time::Duration;

use crate::options::Options;

/// Outcome of one attempt, as seen by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The round trip failed below HTTP semantics.
    TransportError,
    /// A response with this status was received.
    Status(u16),
}

/// Bounded, fixed-interval retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retry_count: u32,
    /// Sleep between attempts.
    pub interval: Duration,
    /// The request body is a stream; such calls run exactly once.
    pub streaming: bool,
}

impl RetryPolicy {
    /// Create a policy for a buffered body.
    pub fn new(retry_count: u32, interval: Duration) -> Self {
        Self {
            retry_count,
            interval,
            streaming: false,
        }
    }

    /// Policy for resolved options.
    pub fn from_options(options: &Options) -> Self {
        Self {
            retry_count: options.retry_count(),
            interval: options.retry_interval(),
            streaming: options.req_stream.is_some(),
        }
    }

    /// Total attempts allowed.
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Check if another attempt should follow `outcome`.
    ///
    /// `attempt` is 1-based.
    pub fn should_retry(&self, attempt: u32, outcome: AttemptOutcome) -> bool {
        if self.streaming || attempt >= self.max_attempts() {
            return false;
        }
        match outcome {
            AttemptOutcome::TransportError => true,
            AttemptOutcome::Status(status) => status >= 500,
        }
    }

    /// Sleep before the next attempt, if any.
    pub fn delay(&self) -> Option<Duration> {
        (!self.interval.is_zero()).then_some(self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
        assert_eq!(RetryPolicy::new(3, Duration::ZERO).max_attempts(), 4);
        assert_eq!(RetryPolicy::new(u32::MAX, Duration::ZERO).max_attempts(), u32::MAX);
    }

    #[test]
    fn test_retry_on_server_error_and_transport_error() {
        let policy = RetryPolicy::new(2, Duration::ZERO);

        assert!(policy.should_retry(1, AttemptOutcome::Status(500)));
        assert!(policy.should_retry(1, AttemptOutcome::Status(503)));
        assert!(policy.should_retry(2, AttemptOutcome::TransportError));
        assert!(!policy.should_retry(3, AttemptOutcome::Status(500)));
    }

    #[test]
    fn test_no_retry_below_500() {
        let policy = RetryPolicy::new(5, Duration::ZERO);

        assert!(!policy.should_retry(1, AttemptOutcome::Status(200)));
        assert!(!policy.should_retry(1, AttemptOutcome::Status(404)));
        assert!(!policy.should_retry(1, AttemptOutcome::Status(499)));
    }

    #[test]
    fn test_streaming_runs_once() {
        let policy = RetryPolicy {
            streaming: true,
            ..RetryPolicy::new(5, Duration::from_millis(10))
        };

        assert!(!policy.should_retry(1, AttemptOutcome::TransportError));
        assert!(!policy.should_retry(1, AttemptOutcome::Status(500)));
    }

    #[test]
    fn test_delay() {
        assert_eq!(RetryPolicy::new(1, Duration::ZERO).delay(), None);
        assert_eq!(
            RetryPolicy::new(1, Duration::from_millis(10)).delay(),
            Some(Duration::from_millis(10))
        );
    }

    #[test]
    fn test_from_options() {
        let options = Options::new()
            .with_retry_count(2)
            .with_retry_interval(Duration::from_millis(5))
            .with_stream(crate::RequestStream::from_bytes("x"));

        let policy = RetryPolicy::from_options(&options);
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.interval, Duration::from_millis(5));
        assert!(policy.streaming);
    }
}

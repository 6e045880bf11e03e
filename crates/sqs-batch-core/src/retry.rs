//! Retry policy for entries that fail transiently in send and delete batches.

use std::time::Duration;

/// How transiently failed entries (`sender_fault == false`) are retried.
///
/// The default retries forever without delay: an entry keeps being requeued
/// until SQS either accepts it or rejects it as the sender's fault. Set
/// `max_attempts` to give up; such entries are then reported as failed with
/// their last failure.
///
/// ```rust
/// use sqs_batch::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::bounded(5)
///     .with_backoff(Duration::from_millis(100), Duration::from_secs(5));
///
/// assert_eq!(policy.delay_for(1), Duration::from_millis(100));
/// assert_eq!(policy.delay_for(2), Duration::from_millis(200));
/// assert!(policy.gives_up_after(5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per entry, including the first. `None` never gives up.
    pub max_attempts: Option<u32>,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,

    /// Growth factor applied per further retry
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::ZERO,
            max_delay: Duration::from_secs(16),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Retries forever, without delay.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Gives up on an entry after `max_attempts` transient failures.
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            ..Self::default()
        }
    }

    /// Enables exponential backoff between retry rounds.
    pub fn with_backoff(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay.max(initial_delay);
        self
    }

    /// Sets the growth factor between retries; values below 1 are raised to 1.
    pub fn with_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier.max(1.0);
        self
    }

    /// Delay before dispatching an entry that has already been attempted
    /// `attempts` times. Zero for entries that were never attempted.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        if attempts == 0 || self.initial_delay.is_zero() {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempts - 1).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }

        Duration::from_secs_f64(secs)
    }

    /// `true` when an entry attempted `attempts` times must not be requeued.
    pub fn gives_up_after(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

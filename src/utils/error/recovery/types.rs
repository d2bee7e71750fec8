//! Types and configurations for error recovery patterns

use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOptions {
    /// Number of retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay, jitter included
    pub max_delay: Duration,
    /// Jitter is drawn uniformly from `[0, max_jitter)`
    pub max_jitter: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryOptions {
    /// Total number of invocations the wrapper will make at most
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Options without jitter, handy for deterministic callers
    pub fn without_jitter(mut self) -> Self {
        self.max_jitter = Duration::ZERO;
        self
    }
}

//! Retry mechanism with exponential backoff

use super::types::RetryOptions;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Delay to wait after failed attempt `attempt` (0-indexed)
///
/// `min(initial_delay * 2^attempt + jitter, max_delay)`, saturating instead of
/// overflowing for large attempt numbers.
pub fn backoff_delay(
    attempt: u32,
    initial_delay: Duration,
    max_delay: Duration,
    jitter: Duration,
) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    let exponential = initial_delay.saturating_mul(factor);
    exponential.saturating_add(jitter).min(max_delay)
}

/// Backoff delay with random jitter drawn from `[0, options.max_jitter)`
pub fn compute_backoff(attempt: u32, options: &RetryOptions) -> Duration {
    let jitter_ms = options.max_jitter.as_millis() as u64;
    let jitter = if jitter_ms == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
    };
    backoff_delay(attempt, options.initial_delay, options.max_delay, jitter)
}

/// Observable retry progress for one logical operation
///
/// Clones share state, so a progress display can hold one clone while the
/// operation runs through another. The state is informational; it never
/// changes how the wrapper behaves.
#[derive(Debug, Clone, Default)]
pub struct RetryTracker {
    pub(super) attempt: Arc<AtomicU32>,
    pub(super) retrying: Arc<AtomicBool>,
}

impl RetryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the attempt in progress (0 for the first invocation)
    pub fn attempt_count(&self) -> u32 {
        self.attempt.load(Ordering::Acquire)
    }

    /// Whether the wrapper is waiting for, or running, a retry
    pub fn is_retrying(&self) -> bool {
        self.retrying.load(Ordering::Acquire)
    }

    /// Clear the attempt count and retrying flag
    ///
    /// An in-flight attempt is not cancelled.
    pub fn reset(&self) {
        self.attempt.store(0, Ordering::Release);
        self.retrying.store(false, Ordering::Release);
    }

    /// Run `operation` up to `max_retries + 1` times
    ///
    /// Returns the first success, or the last error once every attempt failed.
    pub async fn fetch_with_retry<F, Fut, T, E>(
        &self,
        operation: F,
        options: &RetryOptions,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        self.fetch_with_retry_if(operation, options, |_| true).await
    }

    /// Like [`fetch_with_retry`](Self::fetch_with_retry), but an error for
    /// which `should_retry` returns false is returned immediately
    pub async fn fetch_with_retry_if<F, Fut, T, E, P>(
        &self,
        mut operation: F,
        options: &RetryOptions,
        should_retry: P,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        self.reset();
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("Retry succeeded on attempt {}", attempt + 1);
                    }
                    self.retrying.store(false, Ordering::Release);
                    return Ok(value);
                }
                Err(error) => {
                    if attempt >= options.max_retries || !should_retry(&error) {
                        warn!("Giving up after {} attempt(s): {}", attempt + 1, error);
                        self.retrying.store(false, Ordering::Release);
                        return Err(error);
                    }

                    let delay = compute_backoff(attempt, options);
                    debug!(
                        "Attempt {} failed: {}, retrying in {:?}",
                        attempt + 1,
                        error,
                        delay
                    );

                    self.retrying.store(true, Ordering::Release);
                    tokio::time::sleep(delay).await;

                    attempt += 1;
                    self.attempt.store(attempt, Ordering::Release);
                }
            }
        }
    }
}

/// One-shot form of [`RetryTracker::fetch_with_retry`] for callers that do
/// not need progress state
pub async fn fetch_with_retry<F, Fut, T, E>(
    operation: F,
    options: &RetryOptions,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    RetryTracker::new().fetch_with_retry(operation, options).await
}

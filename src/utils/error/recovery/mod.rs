//! Error recovery utilities
//!
//! This module provides retry-with-backoff for fallible async operations.

mod retry;
mod types;

pub use retry::{RetryTracker, backoff_delay, compute_backoff, fetch_with_retry};
pub use types::RetryOptions;

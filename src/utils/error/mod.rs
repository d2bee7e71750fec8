//! Error handling utilities
//!
//! This module provides the hub error type and the retry-with-backoff helpers.

pub mod error;
pub mod recovery;

pub use error::*;
pub use recovery::*;

//! Configuration data models
//!
//! This module defines all configuration structures used by the hub.

#![allow(missing_docs)]

pub mod backend;
pub mod logging;
pub mod realtime;
pub mod retry;
pub mod session;

pub use backend::*;
pub use logging::*;
pub use realtime::*;
pub use retry::*;
pub use session::*;

use std::path::PathBuf;

/// Default database schema
pub fn default_schema() -> String {
    "public".to_string()
}

/// Default request timeout in seconds
pub fn default_timeout() -> u64 {
    30
}

pub fn default_heartbeat_interval() -> u64 {
    30
}

pub fn default_channel_capacity() -> usize {
    64
}

pub fn default_impersonation_key() -> String {
    crate::auth::impersonation::DEFAULT_IMPERSONATION_KEY.to_string()
}

pub fn default_state_file() -> PathBuf {
    PathBuf::from(".hub").join("session.json")
}

/// Default maximum retry attempts
pub fn default_max_retries() -> u32 {
    3
}

pub fn default_initial_delay_ms() -> u64 {
    1000
}

pub fn default_max_delay_ms() -> u64 {
    10_000
}

pub fn default_max_jitter_ms() -> u64 {
    1000
}

pub fn default_log_level() -> String {
    "info".to_string()
}

//! Logging setup
//!
//! The hub logs through `tracing`; this module installs the subscriber.

mod init;

pub use init::{build_filter, init_logging};

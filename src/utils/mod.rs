//! Utility modules for the hub
//!
//! - **error**: error type and retry with backoff
//! - **logging**: tracing subscriber setup

pub mod error;
pub mod logging;

pub use error::{HubError, Result};
pub use logging::init_logging;

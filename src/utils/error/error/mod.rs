//! Error handling for the hub
//!
//! This module defines the error type shared by every hub component.

#![allow(missing_docs)]

mod helpers;
mod types;

pub use types::{HubError, Result};

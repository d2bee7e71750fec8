//! Core behaviour of the hub
//!
//! Badge counters and the memoized resource loader.

pub mod counters;
pub mod loader;

//! Configuration validation
//!
//! - `trait_def`: core Validate trait definition
//! - `validators`: validators for every configuration section
//! - `tests`: test suite for all validators

mod trait_def;
mod validators;

pub use trait_def::Validate;
pub use validators::is_valid_identifier;

//! Community roles and the capabilities they grant
//!
//! Roles form a closed set. Admin and owner are the staff roles; they hold
//! every admin capability and are the only roles allowed to impersonate.

mod capabilities;
mod types;

pub use types::{Capability, UserRole};

//! Authentication-side role handling
//!
//! Roles, their capabilities, and the impersonation override.

pub mod impersonation;
pub mod roles;

pub use impersonation::{ImpersonationResolver, SessionContext};
pub use roles::{Capability, UserRole};

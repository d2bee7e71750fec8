//! Role impersonation
//!
//! Staff (admin and owner) can preview the app as another role. The override
//! lives in a local key/value store so it survives restarts; it only ever
//! applies when the actual role is a staff role.

mod resolver;
mod session;

pub use resolver::{DEFAULT_IMPERSONATION_KEY, ImpersonationResolver};
pub use session::SessionContext;

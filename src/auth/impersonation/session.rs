//! Per-request session context

use crate::auth::roles::{Capability, UserRole};
use serde::{Deserialize, Serialize};

/// Resolved roles for one request or view
///
/// Built by [`ImpersonationResolver::session`](super::ImpersonationResolver::session)
/// and passed explicitly to whatever needs to gate on the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Authenticated role, `None` when signed out
    pub actual_role: Option<UserRole>,
    /// Role after applying impersonation
    pub effective_role: Option<UserRole>,
    /// Whether an override is in effect
    pub impersonating: bool,
}

impl SessionContext {
    /// Context without impersonation
    pub fn new(actual_role: Option<UserRole>) -> Self {
        Self {
            actual_role,
            effective_role: actual_role,
            impersonating: false,
        }
    }

    /// Signed-out context
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn is_authenticated(&self) -> bool {
        self.actual_role.is_some()
    }

    /// Capability check against the effective role
    pub fn has(&self, capability: Capability) -> bool {
        self.effective_role.is_some_and(|r| r.has(capability))
    }

    /// Admin capability check against the effective role
    pub fn has_admin_access(&self) -> bool {
        self.has(Capability::AdminAccess)
    }

    /// Whether the real user may start or stop impersonation
    ///
    /// Checked against the actual role so a staff member previewing as a
    /// member can still switch back.
    pub fn can_impersonate(&self) -> bool {
        self.actual_role.is_some_and(|r| r.can_impersonate())
    }
}

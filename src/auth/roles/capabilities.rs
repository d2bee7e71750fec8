//! Role to capability mapping

use std::collections::HashSet;

use super::types::{Capability, UserRole};

const STAFF_CAPABILITIES: &[Capability] = &[
    Capability::AdminAccess,
    Capability::ModerateContent,
    Capability::ManageVendors,
    Capability::ViewHealthAlerts,
    Capability::ViewContactSubmissions,
    Capability::ImpersonateRoles,
    Capability::PostToFeed,
    Capability::PlayGames,
    Capability::Donate,
    Capability::ManageBesties,
];

impl UserRole {
    /// Capabilities granted by this role
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            UserRole::Admin | UserRole::Owner => STAFF_CAPABILITIES,
            UserRole::Caregiver => &[
                Capability::PostToFeed,
                Capability::PlayGames,
                Capability::Donate,
                Capability::ManageBesties,
            ],
            UserRole::Bestie => &[Capability::PostToFeed, Capability::PlayGames],
            UserRole::Supporter => &[Capability::PlayGames, Capability::Donate],
        }
    }

    /// Check a single capability
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Check that every required capability is granted
    pub fn has_all(&self, required: &[Capability]) -> bool {
        required.iter().all(|c| self.has(*c))
    }

    /// Check that at least one of the capabilities is granted
    pub fn has_any(&self, candidates: &[Capability]) -> bool {
        candidates.iter().any(|c| self.has(*c))
    }

    /// Capabilities as a set, for callers that diff role grants
    pub fn capability_set(&self) -> HashSet<Capability> {
        self.capabilities().iter().copied().collect()
    }
}

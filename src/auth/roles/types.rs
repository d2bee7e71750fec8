//! Role type definitions

use serde::{Deserialize, Serialize};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Platform administrator
    Admin,
    /// Organization owner
    Owner,
    /// Caregiver of one or more besties
    Caregiver,
    /// Community member at the center of the platform
    Bestie,
    /// Donor or general supporter
    Supporter,
}

impl UserRole {
    /// All roles, staff roles first
    pub const ALL: [UserRole; 5] = [
        UserRole::Admin,
        UserRole::Owner,
        UserRole::Caregiver,
        UserRole::Bestie,
        UserRole::Supporter,
    ];

    /// Stable identifier used in storage and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Owner => "owner",
            UserRole::Caregiver => "caregiver",
            UserRole::Bestie => "bestie",
            UserRole::Supporter => "supporter",
        }
    }

    /// Admin and owner
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Owner)
    }

    /// Only staff may view the app as another role
    pub fn can_impersonate(&self) -> bool {
        self.is_staff()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "owner" => Ok(UserRole::Owner),
            "caregiver" => Ok(UserRole::Caregiver),
            "bestie" => Ok(UserRole::Bestie),
            "supporter" => Ok(UserRole::Supporter),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

/// Something a role is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Open the admin dashboard
    AdminAccess,
    /// Review the moderation queue
    ModerateContent,
    /// Approve or reject vendor applications
    ManageVendors,
    /// See health alerts raised by the platform
    ViewHealthAlerts,
    /// Read contact form submissions
    ViewContactSubmissions,
    /// Switch the session to another role
    ImpersonateRoles,
    /// Post to the community feed
    PostToFeed,
    /// Play the mini-games
    PlayGames,
    /// Make donations
    Donate,
    /// Manage linked besties
    ManageBesties,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::AdminAccess => "admin_access",
            Capability::ModerateContent => "moderate_content",
            Capability::ManageVendors => "manage_vendors",
            Capability::ViewHealthAlerts => "view_health_alerts",
            Capability::ViewContactSubmissions => "view_contact_submissions",
            Capability::ImpersonateRoles => "impersonate_roles",
            Capability::PostToFeed => "post_to_feed",
            Capability::PlayGames => "play_games",
            Capability::Donate => "donate",
            Capability::ManageBesties => "manage_besties",
        };
        f.write_str(name)
    }
}

//! Counters shown on the admin badges

use super::types::CounterSpec;
use crate::auth::roles::Capability;

pub const PENDING_VENDORS: &str = "pending_vendors";
pub const MODERATION_QUEUE: &str = "moderation_queue";
pub const HEALTH_ALERTS: &str = "health_alerts";
pub const CONTACT_SUBMISSIONS: &str = "contact_submissions";

/// Vendor applications awaiting approval
pub fn pending_vendors() -> CounterSpec {
    CounterSpec::new(PENDING_VENDORS, "vendors", Capability::ManageVendors).eq("status", "pending")
}

/// Reported content awaiting a moderator
pub fn moderation_queue() -> CounterSpec {
    CounterSpec::new(MODERATION_QUEUE, "content_reports", Capability::ModerateContent)
        .eq("status", "pending")
}

/// Health alerts nobody has resolved yet
pub fn health_alerts() -> CounterSpec {
    CounterSpec::new(HEALTH_ALERTS, "health_alerts", Capability::ViewHealthAlerts)
        .eq("status", "open")
}

/// Contact form submissions nobody has read yet
pub fn contact_submissions() -> CounterSpec {
    CounterSpec::new(
        CONTACT_SUBMISSIONS,
        "contact_form_submissions",
        Capability::ViewContactSubmissions,
    )
    .eq("status", "new")
}

/// Every preset, in badge order
pub fn all() -> Vec<CounterSpec> {
    vec![
        pending_vendors(),
        moderation_queue(),
        health_alerts(),
        contact_submissions(),
    ]
}

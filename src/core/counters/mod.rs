//! Badge counters kept fresh by change notifications
//!
//! A counter fetches an exact count, subscribes to its collection's change
//! feed and re-fetches on every notification. Counters whose capability the
//! session lacks stay at zero without touching the backend.

mod badges;
pub mod presets;
mod synchronizer;
mod types;

pub use badges::{BadgeCount, BadgeCounters};
pub use synchronizer::CounterSynchronizer;
pub use types::{CounterSpec, CounterState};

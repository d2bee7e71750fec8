//! Change feed collaborator
//!
//! A change feed delivers post-hoc notifications about row changes in one
//! collection. Subscriptions are released when dropped.

mod client;
mod memory;
pub mod protocol;
mod types;

pub use client::{RealtimeClient, websocket_url};
pub use memory::MemoryChangeFeed;
pub use types::{ChangeEvent, ChangeFilter, ChangeKind, EventFilter, Subscription};

use crate::utils::error::{HubError, Result};
use async_trait::async_trait;

/// Source of change notifications
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Start receiving changes accepted by `filter`
    async fn subscribe(&self, filter: ChangeFilter) -> Result<Subscription>;
}

/// Feed without a connection; every subscription is refused
///
/// Stands in for the realtime client when it is not needed or cannot
/// connect, so counters still count but never update live.
#[derive(Debug, Clone)]
pub struct OfflineFeed {
    reason: String,
}

impl OfflineFeed {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ChangeFeed for OfflineFeed {
    async fn subscribe(&self, filter: ChangeFilter) -> Result<Subscription> {
        Err(HubError::realtime(format!(
            "no change feed for {}.{}: {}",
            filter.schema, filter.collection, self.reason
        )))
    }
}

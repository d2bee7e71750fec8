//! In-process change feed

use super::ChangeFeed;
use super::types::{ChangeEvent, ChangeFilter, Subscription};
use crate::utils::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

type Subscribers = HashMap<Uuid, (ChangeFilter, mpsc::Sender<ChangeEvent>)>;

/// Fan-out change feed living entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryChangeFeed {
    subscribers: Arc<Mutex<Subscribers>>,
    capacity: usize,
}

impl Default for MemoryChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

impl MemoryChangeFeed {
    /// Feed whose per-subscription buffers hold `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Deliver `event` to every matching subscription
    ///
    /// Returns how many subscriptions received it. A subscription whose
    /// buffer is full misses the event.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let subscribers = self.subscribers.lock();
        let mut delivered = 0;

        for (id, (filter, tx)) in subscribers.iter() {
            if !filter.accepts(&event) {
                continue;
            }
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Subscription {} is lagging, dropped {:?} event", id, event.kind);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }

        delivered
    }

    /// Number of live subscriptions
    pub fn active_subscriptions(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[async_trait]
impl ChangeFeed for MemoryChangeFeed {
    async fn subscribe(&self, filter: ChangeFilter) -> Result<Subscription> {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.capacity);

        self.subscribers.lock().insert(id, (filter.clone(), tx));
        debug!("Subscribed {} to {}.{}", id, filter.schema, filter.collection);

        let subscribers = Arc::downgrade(&self.subscribers);
        Ok(Subscription::new(id, filter, rx, move || {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers.lock().remove(&id);
                debug!("Released subscription {}", id);
            }
        }))
    }
}

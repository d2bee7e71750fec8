//! Aggregate of the badge counters shown to a session

use super::synchronizer::CounterSynchronizer;
use super::types::{CounterSpec, CounterState};
use crate::auth::impersonation::SessionContext;
use crate::storage::realtime::ChangeFeed;
use crate::storage::remote::DataStore;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio_stream::StreamMap;
use tokio_stream::wrappers::WatchStream;
use tracing::info;

/// Point-in-time reading of one badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeCount {
    pub name: String,
    pub count: u64,
    /// False when the session may not see this counter
    pub active: bool,
}

/// A set of counters started together for one session
#[derive(Debug)]
pub struct BadgeCounters {
    counters: Vec<CounterSynchronizer>,
}

impl BadgeCounters {
    /// Start one synchronizer per `CounterSpec`
    pub async fn start(
        specs: &[CounterSpec],
        session: &SessionContext,
        store: Arc<dyn DataStore>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        let counters = join_all(specs.iter().map(|spec| {
            CounterSynchronizer::start(spec.clone(), session, store.clone(), feed.clone())
        }))
        .await;

        let active = counters.iter().filter(|c| c.is_active()).count();
        info!("Started {} badge counter(s), {} active", counters.len(), active);
        Self { counters }
    }

    pub fn get(&self, name: &str) -> Option<&CounterSynchronizer> {
        self.counters.iter().find(|c| c.name() == name)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Wait until every counter has produced a count
    pub async fn ready(&self) {
        join_all(self.counters.iter().map(CounterSynchronizer::ready)).await;
    }

    pub fn snapshot(&self) -> Vec<BadgeCount> {
        self.counters
            .iter()
            .map(|c| BadgeCount {
                name: c.name().to_string(),
                count: c.count(),
                active: c.is_active(),
            })
            .collect()
    }

    /// Sum over all counters
    pub fn total(&self) -> u64 {
        self.counters.iter().map(CounterSynchronizer::count).sum()
    }

    pub fn refresh_all(&self) {
        self.counters.iter().for_each(CounterSynchronizer::refresh);
    }

    /// State transitions of every counter, keyed by counter name
    pub fn updates(&self) -> StreamMap<String, WatchStream<CounterState>> {
        let mut updates = StreamMap::new();
        for counter in &self.counters {
            updates.insert(counter.name().to_string(), WatchStream::new(counter.watch()));
        }
        updates
    }

    pub async fn stop(self) {
        join_all(self.counters.into_iter().map(CounterSynchronizer::stop)).await;
    }
}

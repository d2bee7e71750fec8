//! Change feed types

use crate::storage::remote::Row;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Which change kinds a subscription wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventFilter {
    #[serde(rename = "*")]
    All,
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

impl EventFilter {
    pub fn accepts(&self, kind: ChangeKind) -> bool {
        matches!(
            (self, kind),
            (EventFilter::All, _)
                | (EventFilter::Insert, ChangeKind::Insert)
                | (EventFilter::Update, ChangeKind::Update)
                | (EventFilter::Delete, ChangeKind::Delete)
        )
    }
}

/// Subscription scope: one collection, optionally one change kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeFilter {
    pub schema: String,
    pub collection: String,
    pub event: EventFilter,
}

impl ChangeFilter {
    /// Every change to `collection` in the `public` schema
    pub fn all(collection: impl Into<String>) -> Self {
        Self {
            schema: "public".to_string(),
            collection: collection.into(),
            event: EventFilter::All,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn only(mut self, event: EventFilter) -> Self {
        self.event = event;
        self
    }

    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        self.schema == event.schema
            && self.collection == event.collection
            && self.event.accepts(event.kind)
    }
}

/// Post-hoc notification of a row change
///
/// Record payloads may be empty depending on the table's replica identity;
/// consumers should treat the event as a signal rather than a delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub schema: String,
    pub collection: String,
    #[serde(default)]
    pub commit_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub record: Row,
    #[serde(default)]
    pub old_record: Row,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, schema: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            kind,
            schema: schema.into(),
            collection: collection.into(),
            commit_timestamp: Some(Utc::now()),
            record: Row::new(),
            old_record: Row::new(),
        }
    }

    pub fn with_record(mut self, record: Row) -> Self {
        self.record = record;
        self
    }

    pub fn with_old_record(mut self, old_record: Row) -> Self {
        self.old_record = old_record;
        self
    }
}

type ReleaseFn = Box<dyn FnOnce() + Send + Sync>;

/// Live change feed subscription
///
/// Dropping the subscription releases it on the feed.
pub struct Subscription {
    id: Uuid,
    filter: ChangeFilter,
    events: mpsc::Receiver<ChangeEvent>,
    release: Option<ReleaseFn>,
}

impl Subscription {
    pub fn new(
        id: Uuid,
        filter: ChangeFilter,
        events: mpsc::Receiver<ChangeEvent>,
        release: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            filter,
            events,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }

    /// Next event; `None` once the feed has closed the subscription
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Next already-delivered event, if any
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.events.try_recv().ok()
    }

    /// Release explicitly; same as dropping
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .finish()
    }
}

//! In-memory data store

use super::DataStore;
use super::types::{Query, Row};
use crate::storage::realtime::{ChangeEvent, ChangeKind, MemoryChangeFeed};
use crate::utils::error::{HubError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use tracing::debug;

/// Tables of JSON rows with the same filter semantics as the REST store
///
/// Mutations publish change events to an attached [`MemoryChangeFeed`], which
/// makes the store a stand-in for the hosted backend in tests and demos.
#[derive(Debug)]
pub struct MemoryDataStore {
    schema: String,
    tables: RwLock<HashMap<String, Vec<Row>>>,
    feed: Option<MemoryChangeFeed>,
    unavailable: AtomicBool,
    reads: AtomicU64,
}

impl Default for MemoryDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self {
            schema: "public".to_string(),
            tables: RwLock::new(HashMap::new()),
            feed: None,
            unavailable: AtomicBool::new(false),
            reads: AtomicU64::new(0),
        }
    }

    /// Publish every mutation to `feed`
    pub fn with_feed(mut self, feed: MemoryChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Schema named on published change events
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Make every read fail with a 503 until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Number of reads served or rejected so far
    pub fn read_count(&self) -> u64 {
        self.reads.load(AtomicOrdering::SeqCst)
    }

    /// Append a row
    pub fn insert(&self, collection: &str, row: Row) -> Row {
        self.tables
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(row.clone());

        self.publish(ChangeEvent::new(ChangeKind::Insert, &self.schema, collection).with_record(row.clone()));
        row
    }

    /// Merge `patch` into every matching row; returns the number updated
    pub fn update(&self, query: &Query, patch: Row) -> u64 {
        let mut events = Vec::new();
        {
            let mut tables = self.tables.write();
            let Some(rows) = tables.get_mut(&query.collection) else {
                return 0;
            };
            for row in rows.iter_mut().filter(|r| query.matches(r)) {
                let old = row.clone();
                for (key, value) in &patch {
                    row.insert(key.clone(), value.clone());
                }
                events.push(
                    ChangeEvent::new(ChangeKind::Update, &self.schema, &query.collection)
                        .with_record(row.clone())
                        .with_old_record(old),
                );
            }
        }

        let updated = events.len() as u64;
        events.into_iter().for_each(|e| self.publish(e));
        updated
    }

    /// Remove every matching row; returns the number deleted
    pub fn delete(&self, query: &Query) -> u64 {
        let removed: Vec<Row> = {
            let mut tables = self.tables.write();
            let Some(rows) = tables.get_mut(&query.collection) else {
                return 0;
            };
            let (gone, kept): (Vec<Row>, Vec<Row>) =
                rows.drain(..).partition(|r| query.matches(r));
            *rows = kept;
            gone
        };

        let deleted = removed.len() as u64;
        for old in removed {
            self.publish(
                ChangeEvent::new(ChangeKind::Delete, &self.schema, &query.collection)
                    .with_old_record(old),
            );
        }
        deleted
    }

    fn publish(&self, event: ChangeEvent) {
        if let Some(feed) = &self.feed {
            let delivered = feed.publish(event);
            debug!("Change delivered to {} subscription(s)", delivered);
        }
    }

    fn begin_read(&self) -> Result<()> {
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(HubError::remote(503, "store unavailable"));
        }
        Ok(())
    }

    fn matching(&self, query: &Query) -> Vec<Row> {
        self.tables
            .read()
            .get(&query.collection)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default()
    }
}

fn project(row: Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row;
    }
    columns
        .iter()
        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
        .collect()
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), Some(_)) => Ordering::Greater,
        (Some(_), None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn select(&self, query: &Query) -> Result<Vec<Row>> {
        self.begin_read()?;
        let mut rows = self.matching(query);

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending { ord } else { ord.reverse() }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows
            .into_iter()
            .map(|r| project(r, &query.columns))
            .collect())
    }

    async fn single(&self, query: &Query) -> Result<Option<Row>> {
        let mut rows = self.select(query).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(HubError::remote(
                406,
                format!("expected at most one row from {}, got {}", query.collection, n),
            )),
        }
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        self.begin_read()?;
        Ok(self.matching(query).len() as u64)
    }
}

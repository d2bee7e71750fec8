//! Counter definitions and observable state

use crate::auth::roles::Capability;
use crate::storage::realtime::ChangeFilter;
use crate::storage::remote::{Filter, Query};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A badge counter: rows of one collection matching a status predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSpec {
    /// Unique name, e.g. `pending_vendors`
    pub name: String,
    /// Collection whose rows are counted
    pub collection: String,
    /// Predicates a row must satisfy to be counted
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Capability the session needs before anything is queried
    pub required: Capability,
    /// Schema whose changes are watched; the backend schema when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl CounterSpec {
    pub fn new(name: impl Into<String>, collection: impl Into<String>, required: Capability) -> Self {
        Self {
            name: name.into(),
            collection: collection.into(),
            filters: Vec::new(),
            required,
            schema: None,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Use `schema` unless the counter names its own
    pub fn or_schema(mut self, schema: &str) -> Self {
        self.schema.get_or_insert_with(|| schema.to_string());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    /// Exact-count query for this counter
    pub fn query(&self) -> Query {
        self.filters
            .iter()
            .cloned()
            .fold(Query::new(&self.collection), Query::filter)
    }

    /// Every insert, update and delete on the counted collection
    pub fn change_filter(&self) -> ChangeFilter {
        let filter = ChangeFilter::all(&self.collection);
        match &self.schema {
            Some(schema) => filter.in_schema(schema),
            None => filter,
        }
    }
}

/// Lifecycle of a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "count", rename_all = "snake_case")]
pub enum CounterState {
    /// Not started
    Idle,
    /// A count query is in flight
    Loading,
    /// Latest known count
    Ready(u64),
}

impl CounterState {
    pub fn is_ready(&self) -> bool {
        matches!(self, CounterState::Ready(_))
    }

    /// Count when ready, otherwise zero
    pub fn count(&self) -> u64 {
        match self {
            CounterState::Ready(n) => *n,
            _ => 0,
        }
    }
}

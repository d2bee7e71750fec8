//! Query types for the remote data store

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row as returned by the store
pub type Row = serde_json::Map<String, Value>;

/// Comparison operator of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// `IS` comparison, for null and booleans
    Is,
    /// Membership in a list; the filter value must be an array
    In,
}

impl FilterOp {
    /// Operator token in the REST query string
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Is => "is",
            FilterOp::In => "in",
        }
    }
}

/// Column predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }

    /// Whether `row` satisfies the predicate
    ///
    /// A missing column compares as null.
    pub fn matches(&self, row: &Row) -> bool {
        let actual = row.get(&self.column).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::Eq | FilterOp::Is => loosely_equal(actual, &self.value),
            FilterOp::Neq => !actual.is_null() && !loosely_equal(actual, &self.value),
            FilterOp::Gt => compare(actual, &self.value).is_some_and(|o| o.is_gt()),
            FilterOp::Gte => compare(actual, &self.value).is_some_and(|o| o.is_ge()),
            FilterOp::Lt => compare(actual, &self.value).is_some_and(|o| o.is_lt()),
            FilterOp::Lte => compare(actual, &self.value).is_some_and(|o| o.is_le()),
            FilterOp::In => self
                .value
                .as_array()
                .is_some_and(|items| items.iter().any(|v| loosely_equal(actual, v))),
        }
    }

    /// Value rendered as REST query text, e.g. `eq.pending` or `in.(a,b)`
    pub fn to_query_value(&self) -> String {
        let rendered = match (&self.op, &self.value) {
            (FilterOp::In, Value::Array(items)) => {
                let parts: Vec<String> = items.iter().map(render_scalar).collect();
                format!("({})", parts.join(","))
            }
            (_, value) => render_scalar(value),
        };
        format!("{}.{}", self.op.as_str(), rendered)
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

// String filter values are compared against numbers and booleans by parsing.
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(a), Value::String(b)) | (Value::String(b), Value::Number(a)) => {
            b.parse::<f64>().ok() == a.as_f64()
        }
        (Value::Bool(a), Value::String(b)) | (Value::String(b), Value::Bool(a)) => {
            b.parse::<bool>().ok() == Some(*a)
        }
        (a, b) => a == b,
    }
}

fn compare(actual: &Value, expected: &Value) -> Option<std::cmp::Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Sort order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Read request against one collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Projected columns; empty selects everything
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub order: Option<Order>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `select=` parameter value
    pub fn select_clause(&self) -> String {
        if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        }
    }

    /// Whether every filter accepts `row`
    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

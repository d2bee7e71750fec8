//! Remote data store collaborator
//!
//! The hosted backend exposes collections by name. Reads are expressed as a
//! [`Query`] (collection, filters, projected columns) and return a row set, a
//! single row or an exact count.

mod memory;
mod rest;
mod types;

pub use memory::MemoryDataStore;
pub use rest::RestDataStore;
pub(crate) use rest::{auth_headers, error_for_status};
pub use types::{Filter, FilterOp, Order, Query, Row};

use crate::utils::error::Result;
use async_trait::async_trait;

/// Read access to the remote store of record
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Rows matching the query
    async fn select(&self, query: &Query) -> Result<Vec<Row>>;

    /// Zero or one row; more than one match is an error
    async fn single(&self, query: &Query) -> Result<Option<Row>>;

    /// Exact number of rows matching the query's filters
    async fn count(&self, query: &Query) -> Result<u64>;
}

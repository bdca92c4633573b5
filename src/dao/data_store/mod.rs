pub mod memory;
#[cfg(feature = "rest-store")]
pub mod rest;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::{query::Query, storage::StorageResult};

/// Query-builder client over the hosted relational database.
///
/// Rows travel as JSON objects; typed decoding happens in the repository layer.
pub trait DataStore: Send + Sync {
    /// Return every row matching `query`.
    fn select(&self, query: Query) -> BoxFuture<'static, StorageResult<Vec<Value>>>;
    /// Insert one row and return it as stored.
    fn insert(&self, table: &'static str, row: Value) -> BoxFuture<'static, StorageResult<Value>>;
    /// Merge `patch` into every row matching `query`, returning the updated rows.
    fn update(&self, query: Query, patch: Value) -> BoxFuture<'static, StorageResult<Vec<Value>>>;
    /// Insert `row`, or merge it into the row sharing the same `on_conflict` column value.
    fn upsert(
        &self,
        table: &'static str,
        row: Value,
        on_conflict: &'static str,
    ) -> BoxFuture<'static, StorageResult<Value>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Short backend name reported by the health route.
    fn backend(&self) -> &'static str;

    /// Fetch at most one row; `Ok(None)` means no row matched.
    fn select_single(&self, query: Query) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let rows = self.select(query.limit(1));
        Box::pin(async move { Ok(rows.await?.into_iter().next()) })
    }
}

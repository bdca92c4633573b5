//! In-process table store used for local development and by the test suite.

use std::{
    cmp::Ordering,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering as AtomicOrdering},
    },
};

use dashmap::{DashMap, DashSet};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::DataStore;
use crate::dao::{
    models::tables,
    query::{Query, value_as_text},
    storage::{StorageError, StorageResult},
};

#[derive(Debug, Error)]
#[error("table `{0}` is offline")]
struct TableOffline(&'static str);

/// Table store backed by concurrent maps of JSON rows.
///
/// Unique constraints are enforced on insert and upsert. Tables can be switched offline to
/// simulate backend failures, and reads are counted per table. With
/// [`MemoryDataStore::interleaved`] every call yields to the runtime once before touching the
/// tables, so concurrent callers interleave the way they would against a remote store.
#[derive(Clone, Default)]
pub struct MemoryDataStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    tables: DashMap<&'static str, Vec<Value>>,
    unique: DashMap<&'static str, Vec<&'static str>>,
    offline: DashSet<&'static str>,
    reads: DashMap<&'static str, usize>,
    interleave: AtomicBool,
}

impl MemoryDataStore {
    /// Create an empty store carrying the unique constraints of the profile schema.
    pub fn new() -> Self {
        let store = Self::default();
        store
            .with_unique(tables::PROFILES, "username")
            .with_unique(tables::PROFILES, "auth_user_id")
            .with_unique(tables::NOTIFICATION_SETTINGS, "user_id")
            .with_unique(tables::PRIVACY_SETTINGS, "user_id")
            .with_unique(tables::APPEARANCE_SETTINGS, "user_id")
            .with_unique(tables::USER_STATS, "user_id")
    }

    /// Declare `column` unique within `table`.
    pub fn with_unique(self, table: &'static str, column: &'static str) -> Self {
        self.inner.unique.entry(table).or_default().push(column);
        self
    }

    /// Yield once per call so concurrent operations interleave.
    pub fn interleaved(self) -> Self {
        self.inner.interleave.store(true, AtomicOrdering::Relaxed);
        self
    }

    async fn pause(&self) {
        if self.inner.interleave.load(AtomicOrdering::Relaxed) {
            tokio::task::yield_now().await;
        }
    }

    /// Append rows verbatim, bypassing constraints.
    pub fn seed(&self, table: &'static str, rows: impl IntoIterator<Item = Value>) {
        self.inner.tables.entry(table).or_default().extend(rows);
    }

    /// Snapshot of every row currently stored in `table`.
    pub fn rows(&self, table: &'static str) -> Vec<Value> {
        self.inner
            .tables
            .get(table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Make every operation on `table` fail until [`Self::restore_table`] is called.
    pub fn fail_table(&self, table: &'static str) {
        self.inner.offline.insert(table);
    }

    pub fn restore_table(&self, table: &'static str) {
        self.inner.offline.remove(table);
    }

    /// Number of `select` calls issued against `table`.
    pub fn read_count(&self, table: &'static str) -> usize {
        self.inner.reads.get(table).map(|count| *count).unwrap_or(0)
    }
}

impl MemoryInner {
    fn ensure_online(&self, table: &'static str) -> StorageResult<()> {
        if self.offline.contains(table) {
            return Err(StorageError::unavailable(
                format!("memory table `{table}` unavailable"),
                TableOffline(table),
            ));
        }
        Ok(())
    }

    fn select(&self, query: &Query) -> StorageResult<Vec<Value>> {
        let table = query.table_name();
        *self.reads.entry(table).or_default() += 1;
        self.ensure_online(table)?;

        let mut rows: Vec<Value> = self
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = query.ordering() {
            rows.sort_by(|a, b| compare_column(a, b, order.column, order.descending));
        }
        if let Some(limit) = query.row_limit() {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    fn insert(&self, table: &'static str, row: Value) -> StorageResult<Value> {
        self.ensure_online(table)?;
        let mut row = into_object(table, row)?;
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        let row = Value::Object(row);

        let mut rows = self.tables.entry(table).or_default();
        self.check_unique(table, &rows, &row)?;
        rows.push(row.clone());
        debug!(table, "memory insert");
        Ok(row)
    }

    fn update(&self, query: &Query, patch: Value) -> StorageResult<Vec<Value>> {
        let table = query.table_name();
        self.ensure_online(table)?;
        let patch = into_object(table, patch)?;

        let mut rows = self.tables.entry(table).or_default();
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| query.matches(row)) {
            merge(row, &patch);
            updated.push(row.clone());
        }
        Ok(updated)
    }

    fn upsert(
        &self,
        table: &'static str,
        row: Value,
        on_conflict: &'static str,
    ) -> StorageResult<Value> {
        self.ensure_online(table)?;
        let patch = into_object(table, row)?;
        let key = patch.get(on_conflict).cloned().ok_or_else(|| StorageError::Rejected {
            table: table.to_owned(),
            message: format!("upsert row lacks conflict column `{on_conflict}`"),
        })?;

        {
            let mut rows = self.tables.entry(table).or_default();
            if let Some(existing) = rows.iter_mut().find(|row| row.get(on_conflict) == Some(&key)) {
                merge(existing, &patch);
                return Ok(existing.clone());
            }
        }
        self.insert(table, Value::Object(patch))
    }

    fn check_unique(
        &self,
        table: &'static str,
        rows: &[Value],
        candidate: &Value,
    ) -> StorageResult<()> {
        let Some(columns) = self.unique.get(table) else {
            return Ok(());
        };
        for column in columns.iter() {
            let Some(value) = candidate.get(*column).filter(|value| !value.is_null()) else {
                continue;
            };
            if rows.iter().any(|row| row.get(*column) == Some(value)) {
                return Err(StorageError::Conflict {
                    table: table.to_owned(),
                    message: format!("duplicate value `{}` for `{column}`", value_as_text(value)),
                });
            }
        }
        Ok(())
    }
}

fn into_object(table: &'static str, row: Value) -> StorageResult<Map<String, Value>> {
    match row {
        Value::Object(map) => Ok(map),
        _ => Err(StorageError::Rejected {
            table: table.to_owned(),
            message: "row must be a JSON object".into(),
        }),
    }
}

fn merge(row: &mut Value, patch: &Map<String, Value>) {
    if let Value::Object(target) = row {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Order two rows by `column`; missing and null values always sort last.
fn compare_column(a: &Value, b: &Value, column: &str, descending: bool) -> Ordering {
    let left = a.get(column).filter(|value| !value.is_null());
    let right = b.get(column).filter(|value| !value.is_null());
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => {
            let ordering = match (left, right) {
                (Value::Number(x), Value::Number(y)) => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal),
                (x, y) => value_as_text(x).cmp(&value_as_text(y)),
            };
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
    }
}

impl DataStore for MemoryDataStore {
    fn select(&self, query: Query) -> BoxFuture<'static, StorageResult<Vec<Value>>> {
        let store = self.clone();
        Box::pin(async move {
            store.pause().await;
            store.inner.select(&query)
        })
    }

    fn insert(&self, table: &'static str, row: Value) -> BoxFuture<'static, StorageResult<Value>> {
        let store = self.clone();
        Box::pin(async move {
            store.pause().await;
            store.inner.insert(table, row)
        })
    }

    fn update(&self, query: Query, patch: Value) -> BoxFuture<'static, StorageResult<Vec<Value>>> {
        let store = self.clone();
        Box::pin(async move {
            store.pause().await;
            store.inner.update(&query, patch)
        })
    }

    fn upsert(
        &self,
        table: &'static str,
        row: Value,
        on_conflict: &'static str,
    ) -> BoxFuture<'static, StorageResult<Value>> {
        let store = self.clone();
        Box::pin(async move {
            store.pause().await;
            store.inner.upsert(table, row, on_conflict)
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }

    /// Healthy unless the profile table has been taken offline.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.ensure_online(tables::PROFILES) })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn select_orders_and_limits() {
        let store = MemoryDataStore::new();
        store.seed(
            "matches",
            [
                json!({"user_id": "a", "played_at": "2024-01-01T00:00:00Z"}),
                json!({"user_id": "a", "played_at": "2024-03-01T00:00:00Z"}),
                json!({"user_id": "b", "played_at": "2024-04-01T00:00:00Z"}),
                json!({"user_id": "a", "played_at": null}),
                json!({"user_id": "a", "played_at": "2024-02-01T00:00:00Z"}),
            ],
        );

        let rows = store
            .select(
                Query::table("matches")
                    .eq("user_id", "a")
                    .order_by("played_at", true)
                    .limit(3),
            )
            .await
            .unwrap();

        let dates: Vec<_> = rows.iter().map(|row| row["played_at"].clone()).collect();
        assert_eq!(
            dates,
            vec![
                json!("2024-03-01T00:00:00Z"),
                json!("2024-02-01T00:00:00Z"),
                json!("2024-01-01T00:00:00Z"),
            ]
        );
        assert_eq!(store.read_count("matches"), 1);
    }

    #[tokio::test]
    async fn insert_enforces_unique_columns() {
        let store = MemoryDataStore::new();
        store
            .insert(tables::PROFILES, json!({"username": "gamer1"}))
            .await
            .unwrap();

        let err = store
            .insert(tables::PROFILES, json!({"username": "gamer1"}))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.rows(tables::PROFILES).len(), 1);
    }

    #[tokio::test]
    async fn upsert_merges_existing_row() {
        let store = MemoryDataStore::new();
        store
            .insert(
                tables::PRIVACY_SETTINGS,
                json!({"user_id": "u1", "show_earnings": false, "show_online_status": true}),
            )
            .await
            .unwrap();

        let row = store
            .upsert(
                tables::PRIVACY_SETTINGS,
                json!({"user_id": "u1", "show_earnings": true}),
                "user_id",
            )
            .await
            .unwrap();

        assert_eq!(row["show_earnings"], json!(true));
        assert_eq!(row["show_online_status"], json!(true));
        assert_eq!(store.rows(tables::PRIVACY_SETTINGS).len(), 1);
    }

    #[tokio::test]
    async fn interleaved_calls_yield_between_operations() {
        let store = MemoryDataStore::new().interleaved();
        let (first, second) = tokio::join!(
            store.insert(tables::PROFILES, json!({"username": "gamer1"})),
            store.insert(tables::PROFILES, json!({"username": "gamer1"})),
        );
        assert!(first.is_ok() != second.is_ok());
        assert_eq!(store.rows(tables::PROFILES).len(), 1);
    }

    #[tokio::test]
    async fn offline_table_fails_until_restored() {
        let store = MemoryDataStore::new();
        store.fail_table(tables::CLIPS);
        assert!(store.select(Query::table(tables::CLIPS)).await.is_err());

        store.restore_table(tables::CLIPS);
        assert!(store.select(Query::table(tables::CLIPS)).await.unwrap().is_empty());
    }
}

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;

use crate::dao::{data_store::DataStore, query::Query, storage::StorageResult};

use super::{
    config::RestStoreConfig,
    error::{RestDaoError, RestResult},
};

const REST_PREFIX: &str = "rest/v1";
const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_MERGE: &str = "resolution=merge-duplicates,return=representation";

/// [`DataStore`] speaking the PostgREST dialect exposed by hosted relational databases.
#[derive(Clone)]
pub struct RestDataStore {
    client: Client,
    base_url: Arc<str>,
    api_key: Arc<str>,
}

impl RestDataStore {
    /// Build the HTTP client for the configured project.
    pub fn new(config: RestStoreConfig) -> RestResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| RestDaoError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            api_key: Arc::<str>::from(config.api_key),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, REST_PREFIX, table);
        self.client
            .request(method, url)
            .header("apikey", self.api_key.as_ref())
            .bearer_auth(self.api_key.as_ref())
    }

    async fn send_rows(&self, table: &str, builder: RequestBuilder) -> RestResult<Vec<Value>> {
        let response = builder
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend {
                table: table.to_owned(),
                source,
            })?;
        let response = ensure_success(table, response).await?;

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|source| RestDaoError::DecodeResponse {
                table: table.to_owned(),
                source,
            })
    }

    async fn send_single(&self, table: &str, builder: RequestBuilder) -> RestResult<Value> {
        self.send_rows(table, builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RestDaoError::EmptyRepresentation {
                table: table.to_owned(),
            })
    }
}

/// Translate a [`Query`] into PostgREST query-string parameters.
fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_owned(), query.selected_columns().to_owned())];
    params.extend(
        query
            .filters()
            .iter()
            .map(|(column, value)| ((*column).to_owned(), format!("eq.{value}"))),
    );
    if let Some(order) = query.ordering() {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push((
            "order".to_owned(),
            format!("{}.{direction}.nullslast", order.column),
        ));
    }
    if let Some(limit) = query.row_limit() {
        params.push(("limit".to_owned(), limit.to_string()));
    }
    params
}

async fn ensure_success(table: &str, response: Response) -> RestResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(RestDaoError::RequestStatus {
        table: table.to_owned(),
        status,
        message,
    })
}

impl DataStore for RestDataStore {
    fn select(&self, query: Query) -> BoxFuture<'static, StorageResult<Vec<Value>>> {
        let store = self.clone();
        Box::pin(async move {
            let table = query.table_name();
            let builder = store.request(Method::GET, table).query(&query_params(&query));
            store.send_rows(table, builder).await.map_err(Into::into)
        })
    }

    fn insert(&self, table: &'static str, row: Value) -> BoxFuture<'static, StorageResult<Value>> {
        let store = self.clone();
        Box::pin(async move {
            let builder = store
                .request(Method::POST, table)
                .header("Prefer", PREFER_REPRESENTATION)
                .json(&row);
            store.send_single(table, builder).await.map_err(Into::into)
        })
    }

    fn update(&self, query: Query, patch: Value) -> BoxFuture<'static, StorageResult<Vec<Value>>> {
        let store = self.clone();
        Box::pin(async move {
            let table = query.table_name();
            let filters: Vec<(String, String)> = query
                .filters()
                .iter()
                .map(|(column, value)| ((*column).to_owned(), format!("eq.{value}")))
                .collect();
            let builder = store
                .request(Method::PATCH, table)
                .query(&filters)
                .header("Prefer", PREFER_REPRESENTATION)
                .json(&patch);
            store.send_rows(table, builder).await.map_err(Into::into)
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
            let builder = store
                .request(Method::POST, table)
                .query(&[("on_conflict", on_conflict)])
                .header("Prefer", PREFER_MERGE)
                .json(&row);
            store.send_single(table, builder).await.map_err(Into::into)
        })
    }

    fn backend(&self) -> &'static str {
        "postgrest"
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}/", store.base_url, REST_PREFIX);
            let response = store
                .client
                .get(&url)
                .header("apikey", store.api_key.as_ref())
                .bearer_auth(store.api_key.as_ref())
                .send()
                .await
                .map_err(|source| RestDaoError::RequestSend {
                    table: REST_PREFIX.to_owned(),
                    source,
                })?;
            ensure_success(REST_PREFIX, response).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_follow_postgrest_dialect() {
        let query = Query::table("matches")
            .eq("user_id", "42")
            .order_by("played_at", true)
            .limit(5);

        let params = query_params(&query);
        assert_eq!(
            params,
            vec![
                ("select".to_owned(), "*".to_owned()),
                ("user_id".to_owned(), "eq.42".to_owned()),
                ("order".to_owned(), "played_at.desc.nullslast".to_owned()),
                ("limit".to_owned(), "5".to_owned()),
            ]
        );
    }

    #[test]
    fn conflict_status_maps_to_storage_conflict() {
        let err: crate::dao::storage::StorageError = RestDaoError::RequestStatus {
            table: "profiles".into(),
            status: reqwest::StatusCode::CONFLICT,
            message: "duplicate key".into(),
        }
        .into();
        assert!(err.is_conflict());
    }
}

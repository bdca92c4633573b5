mod config;
mod error;
mod store;

pub use config::RestStoreConfig;
pub use error::{RestDaoError, RestResult};
pub use store::RestDataStore;

use crate::dao::storage::StorageError;

impl From<RestDaoError> for StorageError {
    fn from(err: RestDaoError) -> Self {
        match err {
            RestDaoError::RequestStatus {
                table,
                status,
                message,
            } if status == reqwest::StatusCode::CONFLICT => {
                StorageError::Conflict { table, message }
            }
            RestDaoError::RequestStatus {
                table,
                status,
                message,
            } if status.is_client_error() => StorageError::Rejected { table, message },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}

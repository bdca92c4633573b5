//! Error types shared by the REST storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`RestDaoError`] failures.
pub type RestResult<T> = Result<T, RestDaoError>;

/// Failures that can occur while talking to the hosted database REST endpoint.
#[derive(Debug, Error)]
pub enum RestDaoError {
    /// Required environment variable is missing.
    #[error("missing store environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build store HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request against a table endpoint could not be sent.
    #[error("failed to send request for table `{table}`")]
    RequestSend {
        table: String,
        #[source]
        source: reqwest::Error,
    },
    /// The endpoint answered with an unexpected status code.
    #[error("unexpected status {status} for table `{table}`: {message}")]
    RequestStatus {
        table: String,
        status: StatusCode,
        message: String,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode response for table `{table}`")]
    DecodeResponse {
        table: String,
        #[source]
        source: reqwest::Error,
    },
    /// A write that should echo the stored row returned nothing.
    #[error("empty representation returned for table `{table}`")]
    EmptyRepresentation { table: String },
}

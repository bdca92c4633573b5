use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    auth::IdentityError,
    dao::storage::StorageError,
    dto::profile_update::{UpdateProfileResponse, UpdateReport},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Requested resource was not found.
    #[error("{0}")]
    NotFound(String),
    /// No authenticated caller for a self-scoped operation.
    #[error("{0}")]
    Unauthorized(String),
    /// Authenticated caller may not act on the resource.
    #[error("{0}")]
    Forbidden(String),
    /// Invalid input provided by the client.
    #[error("{0}")]
    InvalidInput(String),
    /// A critical store operation failed. `message` is safe to show to callers.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: StorageError,
    },
    /// The identity provider could not be reached.
    #[error("authentication service unavailable")]
    Identity(#[from] IdentityError),
    /// At least one section of a partial update failed.
    #[error("{} section update(s) failed", .0.failed().count())]
    PartialUpdate(UpdateReport),
}

impl ServiceError {
    pub fn internal(message: impl Into<String>, source: StorageError) -> Self {
        ServiceError::Internal {
            message: message.into(),
            source,
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("{0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
    /// Partial update where some sections failed.
    #[error("partial update failure")]
    PartialUpdate {
        status: StatusCode,
        report: UpdateReport,
    },
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Internal { message, .. } => AppError::Internal(message),
            ServiceError::Identity(_) => {
                AppError::ServiceUnavailable("Authentication service unavailable".into())
            }
            ServiceError::PartialUpdate(report) => {
                let status = if report.only_validation_failures() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                AppError::PartialUpdate { status, report }
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PartialUpdate { status, report } => {
                return (*status, Json(UpdateProfileResponse::from(report.clone())))
                    .into_response();
            }
        };

        let payload = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, payload).into_response()
    }
}

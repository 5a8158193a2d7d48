//! Error types.
//!
//! [`RepoError`] is the typed result of every repository operation, so that
//! callers can tell "no data" apart from "the store could not be reached".
//! [`AppError`] is the HTTP-facing error that renders as `{"error": "..."}`.

use std::time::Duration;

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::ValidationErrors;

use crate::file_storage::StorageError;

/// Failure of a repository operation.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Lookup on an absent key.
    #[error("{0} not found")]
    NotFound(String),

    /// Backend or network failure.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Malformed class name, out-of-range pagination, unknown status and the like.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A read-modify-write lost against a concurrent writer.
    #[error("Concurrent update conflict on {0}")]
    RaceCondition(String),

    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// The store shut down while the operation was in flight.
    #[error("Storage operation canceled")]
    Canceled,

    /// A stored node did not match the expected record shape.
    #[error("Malformed stored record: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepoError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status this error should surface as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::RaceCondition(_) => StatusCode::CONFLICT,
            Self::StorageUnavailable(_) | Self::Timeout(_) | Self::Canceled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status.as_u16(), error = %self.error, "Request failed");
        }

        let body = Json(json!({
            "error": self.error.to_string()
        }));

        (self.status, body).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        Self::new(err.status_code(), err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let status = match &err {
            StorageError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            StorageError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self::unprocessable(err)
    }
}

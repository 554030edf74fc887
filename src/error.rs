//! Error handling.

use arrow::error::ArrowError;
use axum::{
    extract::rejection::QueryRejection,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parquet::errors::ParquetError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tracing::{event, Level};

/// Dataset access error type
///
/// Covers everything that can go wrong between resolving a dataset location and turning its
/// files into typed records.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The distributed filesystem handle was never established
    #[error("distributed storage is not connected")]
    StorageUnavailable,

    /// The resolved path does not exist
    #[error("path {path} not found")]
    PathNotFound { path: String },

    /// Local filesystem error
    #[error("error accessing local storage")]
    Io(#[from] std::io::Error),

    /// Error sending a request to WebHDFS
    #[error("error communicating with WebHDFS")]
    Http(#[from] reqwest::Error),

    /// WebHDFS answered with an error status
    #[error("WebHDFS request failed with status {status}: {exception}")]
    WebHdfs {
        status: u16,
        exception: String,
        message: String,
    },

    /// Error building a WebHDFS URL
    #[error("invalid WebHDFS URL")]
    Url(#[from] url::ParseError),

    /// Error decoding a parquet file
    #[error("failed to decode parquet data")]
    Parquet(#[from] ParquetError),

    /// Error converting arrow column data
    #[error("failed to convert column data")]
    Arrow(#[from] ArrowError),

    /// A column required by a record is absent
    #[error("column {column} is missing")]
    MissingColumn { column: String },

    /// A column holds a value of an unexpected type
    #[error("column {column} is not of type {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    /// A parquet column of a type we cannot represent
    #[error("column {column} has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    /// A blocking decode task panicked or was cancelled
    #[error("dataset decoding task failed")]
    Task(#[from] tokio::task::JoinError),
}

impl DatasetError {
    /// Whether this error means the storage backend itself cannot be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DatasetError::StorageUnavailable)
    }

    /// Whether this error means the requested path simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatasetError::PathNotFound { path: _ })
    }
}

/// API error type
///
/// Each variant results in a different API error response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Error deserialising the query string
    #[error("request query is not valid")]
    RequestQueryRejection(#[from] QueryRejection),

    /// Error validating the query string
    #[error("request query is not valid")]
    RequestValidation(#[from] validator::ValidationErrors),

    /// Cause label outside the configured enumeration
    #[error("unknown cause {cause}")]
    UnknownCause { cause: String },

    /// The query produced no data
    #[error("{message}")]
    NotFound { message: String },

    /// A dataset fault that was not downgraded to an empty result
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl ApiError {
    /// Return a not found error with the given message.
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    /// Convert from an `ApiError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    /// Return a 503 service unavailable ErrorResponse
    fn service_unavailable<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, error)
    }
}

impl From<ApiError> for ErrorResponse {
    /// Convert from an `ApiError` into an `ErrorResponse`.
    fn from(error: ApiError) -> Self {
        let response = match &error {
            // Bad request
            ApiError::RequestQueryRejection(_)
            | ApiError::RequestValidation(_)
            | ApiError::UnknownCause { cause: _ } => Self::bad_request(&error),

            // Not found
            ApiError::NotFound { message: _ } => Self::not_found(&error),

            // Service unavailable
            ApiError::Dataset(DatasetError::StorageUnavailable) => {
                Self::service_unavailable(&error)
            }

            // Internal server error
            ApiError::Dataset(_) => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}

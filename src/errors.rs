//! Error handling for the log service
//!
//! Client-side failures map to 400, store failures to 500. Every variant
//! renders the text that is returned verbatim to the caller.

use crate::log_store::StoreError;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body returned for store failures when raw error text is not exposed
pub const OPAQUE_STORE_ERROR: &str = "Internal store error";

/// Main error type for the log service
#[derive(Error, Debug)]
pub enum LogServiceError {
    #[error("Request body is required")]
    MissingBody,

    #[error("Invalid JSON format")]
    MalformedInput {
        #[source]
        source: serde_json::Error,
    },

    #[error("Both 'severity' and 'message' are required in the request body")]
    MissingRequiredField,

    #[error("Severity must be info, warning, or error")]
    InvalidSeverity { severity: String },

    #[error("{source}")]
    StoreFailure {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Request worker failed: {source}")]
    Worker {
        #[from]
        source: tokio::task::JoinError,
    },
}

/// Type alias for Result with LogServiceError
pub type LogServiceResult<T> = Result<T, LogServiceError>;

impl LogServiceError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a store failure for the named operation
    pub fn store(operation: &'static str, source: StoreError) -> Self {
        Self::StoreFailure { operation, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LogServiceError::MissingBody
            | LogServiceError::MalformedInput { .. }
            | LogServiceError::MissingRequiredField
            | LogServiceError::InvalidSeverity { .. } => StatusCode::BAD_REQUEST,
            LogServiceError::StoreFailure { .. }
            | LogServiceError::Config { .. }
            | LogServiceError::Worker { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures caused by the caller's request
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Render the error, replacing store failure detail with an opaque text
    /// unless `expose_store_errors` is set.
    pub fn into_response_with(self, expose_store_errors: bool) -> Response {
        let status = self.status_code();
        let body = match &self {
            LogServiceError::StoreFailure { .. } if !expose_store_errors => {
                OPAQUE_STORE_ERROR.to_string()
            }
            _ => self.to_string(),
        };

        // Plain body, no Content-Type header.
        (status, Body::from(body)).into_response()
    }
}

impl IntoResponse for LogServiceError {
    fn into_response(self) -> Response {
        self.into_response_with(true)
    }
}

impl From<figment::Error> for LogServiceError {
    fn from(err: figment::Error) -> Self {
        LogServiceError::config(err.to_string())
    }
}

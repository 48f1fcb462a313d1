//! Error types for the transient store
//!
//! Store operations report success as `bool` / `Option`; this enum covers the
//! layers around them (substrate I/O, configuration, HTTP and CLI surfaces).

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Transient Error Enum ==
/// Unified error type for the transient store.
#[derive(Error, Debug)]
pub enum TransientError {
    /// Transient is not set (never set, expired, or short-circuited)
    #[error("Transient with key \"{0}\" is not set")]
    NotFound(String),

    /// A write did not take effect
    #[error("Transient \"{0}\" was not written")]
    NotWritten(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backing option table could not be loaded or persisted
    #[error("Storage error: {0}")]
    Storage(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for TransientError {
    fn into_response(self) -> Response {
        let status = match &self {
            TransientError::NotFound(_) => StatusCode::NOT_FOUND,
            TransientError::NotWritten(_) => StatusCode::CONFLICT,
            TransientError::InvalidRequest(_) | TransientError::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            TransientError::Storage(_) | TransientError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Extractor Rejections ==
/// Malformed or incomplete JSON bodies are client errors like any other
/// invalid request, reported with the same `{"error": ...}` body.
impl From<JsonRejection> for TransientError {
    fn from(rejection: JsonRejection) -> Self {
        TransientError::InvalidRequest(rejection.body_text())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the transient store.
pub type Result<T> = std::result::Result<T, TransientError>;

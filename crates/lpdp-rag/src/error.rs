//! Error types for the RAG assistant

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Generic client-facing message for failures we do not describe further
pub const GENERIC_FAILURE: &str = "Terjadi kesalahan dalam memproses pertanyaan";

/// RAG assistant errors
#[derive(Debug, Error)]
pub enum Error {
    /// Question rejected by validation (empty, too long, off-domain)
    #[error("{0}")]
    InvalidInput(String),

    /// Session sent another question inside the cooldown window
    #[error("{0}")]
    RateLimited(String),

    /// An upstream adapter (LLM, vector index) is not initialized
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Unexpected failure; the message is safe to show to clients
    #[error("{0}")]
    Internal(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorDb(String),

    /// Chat completion error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Session store error
    #[error("Session store error: {0}")]
    Session(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a service unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status for this error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) | Error::FileParse { .. } | Error::UnsupportedFileType(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that may be shown to the client
    pub fn client_message(&self) -> String {
        match self {
            Error::InvalidInput(msg)
            | Error::RateLimited(msg)
            | Error::ServiceUnavailable(msg)
            | Error::Internal(msg) => msg.clone(),
            Error::FileParse { filename, .. } => format!("Gagal memproses dokumen '{}'", filename),
            Error::UnsupportedFileType(ext) => format!("Tipe file tidak didukung: {}", ext),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}

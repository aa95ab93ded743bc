use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL not found: {0}")]
    UrlNotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Short code space exhausted after {attempts} attempts at length {length}")]
    CodespaceExhausted { attempts: u32, length: usize },

    #[error("Backend responded with {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error means the backend could not be reached or failed on its side.
    pub fn is_unavailable(&self) -> bool {
        match self {
            AppError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            AppError::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, error_code) = match &self {
            AppError::UrlNotFound(_) => (StatusCode::NOT_FOUND, self.to_string(), "NOT_FOUND"),
            AppError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, self.to_string(), "INVALID_URL"),
            AppError::CodespaceExhausted { attempts, length } => {
                tracing::error!(
                    attempts,
                    length,
                    "Short code space exhausted; increase SHORT_CODE_LENGTH"
                );
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    self.to_string(),
                    "CODESPACE_EXHAUSTED",
                )
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Data serialization error".to_string(),
                    "SERIALIZATION_ERROR",
                )
            }
            _ => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = json!({
            "error": error_code,
            "message": error_message,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;

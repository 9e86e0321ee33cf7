//! Application error types

use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream authentication error: {0}")]
    UpstreamAuth(String),

    #[error("Upstream rejected request: {0}")]
    UpstreamBadRequest(String),

    #[error("Upstream provider error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a caller may reasonably retry the failed operation.
    ///
    /// Auth and bad-request failures from a provider are final; transient
    /// upstream failures have already been retried internally but a later
    /// attempt may still succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Upstream(_) | AppError::Http(_))
    }
}

/// Serializable error response for the HTTP layer
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    /// HTTP status the external routing layer should answer with
    pub fn http_status(&self) -> u16 {
        match self.code.as_str() {
            "VALIDATION_ERROR" | "INVALID_RANGE" => 400,
            "NOT_FOUND" => 404,
            "UPSTREAM_AUTH_ERROR" | "UPSTREAM_BAD_REQUEST" | "UPSTREAM_ERROR" => 502,
            _ => 500,
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        let (code, message) = match &err {
            AppError::Database(_) => ("DATABASE_ERROR", err.to_string()),
            AppError::Serialization(_) => ("SERIALIZATION_ERROR", err.to_string()),
            AppError::Http(_) => ("HTTP_ERROR", err.to_string()),
            AppError::Validation(_) => ("VALIDATION_ERROR", err.to_string()),
            AppError::InvalidRange(_) => ("INVALID_RANGE", err.to_string()),
            AppError::NotFound(_) => ("NOT_FOUND", err.to_string()),
            AppError::UpstreamAuth(_) => ("UPSTREAM_AUTH_ERROR", err.to_string()),
            AppError::UpstreamBadRequest(_) => ("UPSTREAM_BAD_REQUEST", err.to_string()),
            AppError::Upstream(_) => ("UPSTREAM_ERROR", err.to_string()),
            AppError::Config(_) => ("CONFIG_ERROR", err.to_string()),
            AppError::Io(_) => ("IO_ERROR", err.to_string()),
            AppError::Internal(_) => ("INTERNAL_ERROR", err.to_string()),
        };

        ErrorResponse {
            code: code.to_string(),
            message,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_codes() {
        let resp: ErrorResponse = AppError::InvalidRange("start must be <= end".into()).into();
        assert_eq!(resp.code, "INVALID_RANGE");
        assert_eq!(resp.http_status(), 400);

        let resp: ErrorResponse = AppError::NotFound("ticker not found".into()).into();
        assert_eq!(resp.http_status(), 404);

        let resp: ErrorResponse = AppError::Upstream("fetch failed".into()).into();
        assert_eq!(resp.http_status(), 502);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::Upstream("timeout".into()).is_retryable());
        assert!(!AppError::UpstreamAuth("401".into()).is_retryable());
        assert!(!AppError::UpstreamBadRequest("400".into()).is_retryable());
    }
}

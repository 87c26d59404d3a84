use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid PORT value '{0}'")]
    InvalidPort(String),

    #[error("invalid HOST value '{0}'")]
    InvalidHost(String),
}

/// Failures that reach the HTTP boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid request body: {0}")]
    MalformedBody(String),

    #[error("invalid query string: {0}")]
    MalformedQuery(String),

    #[error("{message}: {source}")]
    Storage {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn storage(message: &'static str, source: StoreError) -> Self {
        Self::Storage { message, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody(_) | ApiError::MalformedQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            ApiError::Validation(message) => ErrorResponse {
                success: false,
                message,
                error: None,
            },
            ApiError::MalformedBody(detail) => ErrorResponse {
                success: false,
                message: format!("invalid request body: {}", detail),
                error: None,
            },
            ApiError::MalformedQuery(detail) => ErrorResponse {
                success: false,
                message: format!("invalid query string: {}", detail),
                error: None,
            },
            ApiError::Storage { message, source } => {
                error!("{}: {}", message, source);
                ErrorResponse {
                    success: false,
                    message: message.to_string(),
                    error: Some(source.to_string()),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_error() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied")
    }

    #[test]
    fn store_error_names_the_path() {
        let err = StoreError::Write {
            path: PathBuf::from("/data/locations.csv"),
            source: io_error(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/locations.csv"));
        assert!(msg.contains("access denied"));
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MalformedBody("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MalformedQuery("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        let err = ApiError::storage(
            "Failed to read locations",
            StoreError::Read {
                path: PathBuf::from("a.csv"),
                source: io_error(),
            },
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_response_omits_empty_error_field() {
        let body = ErrorResponse {
            success: false,
            message: "Latitude and longitude are required".to_string(),
            error: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "message": "Latitude and longitude are required"
            })
        );
    }
}

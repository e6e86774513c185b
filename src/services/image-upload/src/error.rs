use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use thiserror::Error;

/// Result type alias for image upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Main error type for the image upload service
#[derive(Error, Debug)]
pub enum UploadError {
    // Policy errors
    #[error("Invalid file type")]
    InvalidFileType { mime_type: String },

    #[error("Invalid mime type!")]
    InvalidMimeType { mime_type: String },

    #[error("{message}")]
    FileSizeExceeded { limit: u64, message: String },

    // Request errors
    #[error("Missing file field: {field}")]
    MissingFile { field: String },

    #[error("Malformed multipart payload: {message}")]
    Multipart { message: String },

    // IO and configuration errors
    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    pub details: Option<serde_json::Value>,
    /// Request ID for tracking
    pub request_id: Option<String>,
    /// Timestamp of the error
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl UploadError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::InvalidFileType { .. }
            | UploadError::MissingFile { .. }
            | UploadError::Multipart { .. } => StatusCode::BAD_REQUEST,

            UploadError::InvalidMimeType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            UploadError::FileSizeExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            UploadError::IoError { .. } | UploadError::ConfigurationError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            UploadError::InvalidFileType { .. } => "INVALID_FILE_TYPE",
            UploadError::InvalidMimeType { .. } => "INVALID_MIME_TYPE",
            UploadError::FileSizeExceeded { .. } => "FILE_SIZE_EXCEEDED",
            UploadError::MissingFile { .. } => "MISSING_FILE",
            UploadError::Multipart { .. } => "MULTIPART_ERROR",
            UploadError::IoError { .. } => "IO_ERROR",
            UploadError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
        }
    }

    /// True for errors raised because the upload went over the byte limit
    pub fn is_size_exceeded(&self) -> bool {
        matches!(self, UploadError::FileSizeExceeded { .. })
    }

    /// Create error response for API
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            details: self.get_details(),
            request_id: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Render the error, echoing the id the request was tagged with
    pub fn into_response_with_request_id(self, request_id: Option<String>) -> Response {
        let status = self.status_code();
        let mut error_response = self.to_error_response();
        error_response.request_id = request_id;
        (status, Json(error_response)).into_response()
    }

    /// Get additional error details
    fn get_details(&self) -> Option<serde_json::Value> {
        match self {
            UploadError::InvalidFileType { mime_type } | UploadError::InvalidMimeType { mime_type } => {
                Some(serde_json::json!({
                    "mime_type": mime_type,
                    "allowed_types": crate::policy::accepted_mime_types().collect::<Vec<_>>(),
                }))
            }
            UploadError::FileSizeExceeded { limit, .. } => Some(serde_json::json!({
                "max_size": limit
            })),
            UploadError::MissingFile { field } => Some(serde_json::json!({
                "field": field
            })),
            _ => None,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        self.into_response_with_request_id(None)
    }
}

// Conversion implementations for common error types

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for UploadError {
    fn from(err: config::ConfigError) -> Self {
        UploadError::ConfigurationError {
            message: err.to_string(),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for UploadError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        // The body limit layer reports an over-sized stream as 413
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::FileSizeExceeded {
                limit: 0,
                message: err.body_text(),
            }
        } else {
            UploadError::Multipart {
                message: err.body_text(),
            }
        }
    }
}

// Utility functions for creating common errors

impl UploadError {
    pub fn invalid_file_type<S: Into<String>>(mime_type: S) -> Self {
        Self::InvalidFileType {
            mime_type: mime_type.into(),
        }
    }

    pub fn invalid_mime_type<S: Into<String>>(mime_type: S) -> Self {
        Self::InvalidMimeType {
            mime_type: mime_type.into(),
        }
    }

    pub fn file_size_exceeded<S: Into<String>>(limit: u64, message: S) -> Self {
        Self::FileSizeExceeded {
            limit,
            message: message.into(),
        }
    }
}

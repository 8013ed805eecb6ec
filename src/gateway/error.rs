use crate::ftms::StorageError;
use crate::pipeline::ProcessError;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub details: String,
}

/// Gateway errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("File exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },

    #[error("Malformed upload: {message}")]
    Multipart { status: StatusCode, message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Multipart {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "No file uploaded"),
            ApiError::InvalidFileType(_) => (StatusCode::BAD_REQUEST, "Invalid file type"),
            ApiError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "File too large"),
            ApiError::Multipart { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                (StatusCode::PAYLOAD_TOO_LARGE, "File too large")
            }
            ApiError::Multipart { .. } => (StatusCode::BAD_REQUEST, "Malformed upload"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store file"),
            // Each pipeline failure has its own status; only infrastructure faults are 500.
            ApiError::Process(err) => match err {
                ProcessError::NotFound(_) => (StatusCode::NOT_FOUND, "File not found"),
                ProcessError::UnsupportedContentType(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported content type")
                }
                ProcessError::ExtractionExhausted(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "Could not extract meaningful text")
                }
                ProcessError::ModelInvocationFailed(_) => (StatusCode::BAD_GATEWAY, "AI processing failed"),
                ProcessError::Storage(_) | ProcessError::Extraction(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label) = self.status_and_label();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        let body = ErrorBody {
            error: label,
            details: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorBody;

pub type AppResult<T> = Result<T, AppError>;

pub const NO_TEXT_PROVIDED: &str = "No text provided";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const SUMMARY_FAILED: &str = "Failed to generate summary";
pub const INVALID_PDF: &str = "Please upload a valid PDF file.";
pub const NO_DOCUMENT: &str = "Please upload a PDF file first.";

/// Failures talking to the completion provider. The cause is kept for the
/// logs only; callers always see [`SUMMARY_FAILED`].
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("upstream response contained no choices")]
    NoChoices,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Unsupported media type: {}", media_type.as_deref().unwrap_or("none"))]
    UnsupportedMedia { media_type: Option<String> },

    #[error("Missing file in request")]
    MissingFile,

    #[error("PDF extraction failed: {message}")]
    ExtractionError { message: String },

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Upstream completion failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Summarization service responded {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::UnsupportedMedia { .. } => "UNSUPPORTED_MEDIA",
            AppError::MissingFile => "MISSING_FILE",
            AppError::ExtractionError { .. } => "EXTRACTION_ERROR",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            AppError::Remote { .. } => "REMOTE_ERROR",
            AppError::ConfigError { .. } => "CONFIG_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMedia { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::ExtractionError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Remote { .. } => StatusCode::BAD_GATEWAY,
            AppError::ConfigError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message placed in the `{ "error": ... }` body.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError { message } => message.clone(),
            AppError::UnsupportedMedia { .. } => INVALID_PDF.to_string(),
            AppError::MissingFile => NO_DOCUMENT.to_string(),
            AppError::ExtractionError { .. } => "Failed to extract text from PDF".to_string(),
            AppError::FileTooLarge { .. } => self.to_string(),
            AppError::Upstream(_) => SUMMARY_FAILED.to_string(),
            AppError::MethodNotAllowed => METHOD_NOT_ALLOWED.to_string(),
            AppError::Remote { message, .. } => message.clone(),
            AppError::ConfigError { .. } | AppError::Internal { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.public_message(),
        }
    }

    pub fn log(&self, request_id: &str) {
        self.report().log(request_id);
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            error_code: self.error_code(),
            status: self.status_code(),
            message: self.to_string(),
        }
    }
}

/// What gets logged about a failed request. [`AppError`]'s response carries
/// one in its extensions so the request logging middleware can record it
/// under the request's id.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub error_code: &'static str,
    pub status: StatusCode,
    pub message: String,
}

impl ErrorReport {
    pub fn log(&self, request_id: &str) {
        if self.status.is_server_error() {
            tracing::error!(
                error_code = self.error_code,
                status_code = %self.status,
                request_id = %request_id,
                error_message = %self.message,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                error_code = self.error_code,
                status_code = %self.status,
                request_id = %request_id,
                error_message = %self.message,
                "Request rejected"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), Json(self.body())).into_response();
        response.extensions_mut().insert(self.report());
        response
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<lopdf::Error> for AppError {
    fn from(err: lopdf::Error) -> Self {
        AppError::ExtractionError {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal {
            message: format!("Background task failed: {}", err),
        }
    }
}

// Helper methods for creating specific errors
impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn no_text() -> Self {
        Self::validation(NO_TEXT_PROVIDED)
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        AppError::ExtractionError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::ConfigError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }
}

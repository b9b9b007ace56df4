use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Main error type for the ATRAC server
#[derive(Error, Debug)]
pub enum AtracError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Upload too large: {0}")]
    TooLarge(String),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Request parameters that were rejected before any tool ran
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid encoding type")]
    InvalidEncodingType,

    #[error("Can only normalize loudness from -70 to -5 dB")]
    LoudnessOutOfRange,

    #[error("Invalid value for {field}: {value}")]
    InvalidParameter { field: &'static str, value: String },

    /// Query string that could not be deserialized at all
    #[error("{0}")]
    MalformedQuery(String),
}

/// External tool failures
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with code {exit_code}")]
    NonZeroExit {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("{program} timed out after {timeout_secs}s")]
    TimedOut { program: String, timeout_secs: u64 },

    #[error("{program} produced no output at {path}")]
    MissingOutput { program: String, path: String },
}

/// JSON body of every error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    /// Human-readable reason
    pub detail: String,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AtracError>;

impl IntoResponse for AtracError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AtracError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AtracError::Upload(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AtracError::TooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AtracError::Tool(e) => {
                if let ToolError::NonZeroExit { stderr, .. } = e {
                    tracing::error!(error = %e, stderr = %stderr, "audio tool failed");
                } else {
                    tracing::error!(error = %e, "audio tool failed");
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Audio conversion failed".to_string(),
                )
            }
            AtracError::Io(e) => {
                tracing::error!(error = %e, "IO error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AtracError::Config(msg) => {
                tracing::error!(message = %msg, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorDetail { detail })).into_response()
    }
}

//! Error types for handover
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (validation, bad args, unknown ids, missing session)
//! - 3: Backend unavailable (network, timeout, HTTP error status); retryable
//! - 4: Operation failed (malformed data, IO, serialization)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the handover CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const BACKEND_UNAVAILABLE: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for handover operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Handover not found: {0}")]
    HandoverNotFound(i64),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("No session credentials (uid and token) available")]
    MissingSession,

    // Backend unavailable (exit code 3)
    #[error("Backend unreachable: {0}")]
    Network(String),

    #[error("Backend did not respond within {0}s")]
    Timeout(u64),

    #[error("Backend returned HTTP {status} for {path}")]
    Backend { status: u16, path: String },

    // Operation failures (exit code 4)
    #[error("Unexpected response shape: {0}")]
    DataShape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Failed to read {path}: {message}")]
    ReadFailed { path: PathBuf, message: String },
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::HandoverNotFound(_)
            | Error::TaskNotFound(_)
            | Error::MissingSession => exit_codes::USER_ERROR,

            Error::Network(_) | Error::Timeout(_) | Error::Backend { .. } => {
                exit_codes::BACKEND_UNAVAILABLE
            }

            Error::DataShape(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::ReadFailed { .. } => exit_codes::OPERATION_FAILED,
        }
    }

    /// Whether retrying the same call may succeed without user changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout(_) => true,
            Error::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Structured details for the JSON error envelope.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Backend { status, path } => Some(serde_json::json!({
                "status": status,
                "path": path,
            })),
            Error::Timeout(secs) => Some(serde_json::json!({ "timeout_secs": secs })),
            Error::HandoverNotFound(id) => Some(serde_json::json!({ "handover_id": id })),
            Error::TaskNotFound(id) => Some(serde_json::json!({ "task_id": id })),
            _ => None,
        }
    }
}

/// Result type alias for handover operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            retryable: err.is_retryable(),
            details: err.details(),
        }
    }
}

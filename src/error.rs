//! Error types for taskboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (validation, bad config, unknown task, not signed in)
//! - 4: Operation failed (store backend, I/O, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskboard CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not signed in")]
    NotSignedIn,

    // Operation failures (exit code 4)
    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound(_)
            | Error::Validation(_)
            | Error::InvalidConfig(_)
            | Error::NotSignedIn
            | Error::TomlParse(_) => exit_codes::USER_ERROR,

            Error::Store(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Short machine-readable kind used in JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::Validation(_) => "validation",
            Error::InvalidConfig(_) | Error::TomlParse(_) => "invalid_config",
            Error::NotSignedIn => "not_signed_in",
            _ => "store",
        }
    }

    /// True when the referenced task was absent, as opposed to a backend failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Structured details for errors that carry a subject.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound(id) => Some(serde_json::json!({ "task_id": id })),
            Error::LockFailed(path) => Some(serde_json::json!({ "path": path })),
            Error::Validation(message) | Error::InvalidConfig(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            _ => None,
        }
    }
}

/// Result type alias for taskboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}

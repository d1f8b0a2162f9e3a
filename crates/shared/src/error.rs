use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

/// Wire shape for server error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failures the session controller reports to its caller.
///
/// `Initialization` is fatal to the session: the caller surfaces it once and
/// leaves the session degraded. Per-slot resource failures never reach this
/// type; they collapse to a placeholder in the affected display slot.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("initialization failed: {0}")]
    Initialization(String),
    #[error("file '{0}' is not in the file list")]
    NotFound(String),
}

//! Error types for the progress session registry.

use thiserror::Error;

/// Failures inside a single session transition.
///
/// The registry's public lifecycle API never surfaces these to callers. They are
/// logged and the transition degrades to a no-op (or, for callback failures,
/// cleanup proceeds anyway).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not active: {0}")]
    UnknownSession(String),

    #[error("Phase index {index} out of range for session {id} ({len} phases)")]
    InvalidPhaseIndex { id: String, index: usize, len: usize },

    #[error("Cancel callback for session {id} failed: {reason}")]
    CallbackFailure { id: String, reason: String },
}

/// Errors from the surfaces around the registry (configuration, logging setup).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

use thiserror::Error;

use crate::models::FailureKind;

/// Application-wide error types for Ferry.
#[derive(Error, Debug)]
pub enum AppError {
    /// Server answered with a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Connection could not be established in time.
    #[error("Connect timed out after {0} seconds")]
    Timeout(u64),

    /// Local sink could not be created, written or removed.
    #[error("Filesystem error: {0}")]
    FilesystemError(String),

    /// A run cannot start (e.g. the import directory cannot be created).
    #[error("Precondition failed: {0}")]
    PreconditionError(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Classifies a single-fetch error for the outcome recorded on the field.
    ///
    /// Anything that is not a local filesystem problem counts as a network
    /// failure.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AppError::FilesystemError(_) => FailureKind::Filesystem,
            _ => FailureKind::Network,
        }
    }

    /// Returns true if this error aborts a whole run rather than one fetch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::PreconditionError(_) | AppError::ConfigError(_)
        )
    }
}

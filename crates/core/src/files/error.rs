//! File lifecycle error types.

use tether_shared::{AppError, FileId};
use thiserror::Error;

use crate::storage::StorageError;

/// Metadata store errors.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A record with this id already exists in the tenant.
    #[error("file record already exists: {0}")]
    Duplicate(FileId),

    /// The backing store failed.
    #[error("metadata backend error: {0}")]
    Backend(String),
}

impl RepositoryError {
    /// Create a backend error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// File lifecycle errors.
///
/// Wrapping variants carry the operation that failed.
#[derive(Debug, Error)]
pub enum FileError {
    /// The request is malformed.
    #[error("{operation}: invalid input: {reason}")]
    InputValidationFailed {
        /// Failed operation.
        operation: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// The blob could not be written (including name conflicts).
    #[error("{operation}: storage write failed: {source}")]
    StorageWriteFailed {
        /// Failed operation.
        operation: &'static str,
        /// Cause.
        source: StorageError,
    },

    /// The blob could not be read.
    #[error("{operation}: storage read failed: {source}")]
    StorageReadFailed {
        /// Failed operation.
        operation: &'static str,
        /// Cause.
        source: StorageError,
    },

    /// The blob could not be deleted.
    #[error("{operation}: storage delete failed: {source}")]
    StorageDeleteFailed {
        /// Failed operation.
        operation: &'static str,
        /// Cause.
        source: StorageError,
    },

    /// No record with this id in the tenant.
    #[error("{operation}: file not found: {file_id}")]
    MetadataNotFound {
        /// Failed operation.
        operation: &'static str,
        /// Requested id.
        file_id: FileId,
    },

    /// The metadata store could not be read.
    #[error("{operation}: metadata read failed: {source}")]
    MetadataReadFailed {
        /// Failed operation.
        operation: &'static str,
        /// Cause.
        source: RepositoryError,
    },

    /// The metadata store could not be written.
    #[error("{operation}: metadata write failed: {source}")]
    MetadataWriteFailed {
        /// Failed operation.
        operation: &'static str,
        /// Cause.
        source: RepositoryError,
    },

    /// A download URL could not be issued.
    #[error("{operation}: url issuance failed: {source}")]
    UrlIssuanceFailed {
        /// Failed operation.
        operation: &'static str,
        /// Cause.
        source: StorageError,
    },

    /// The caller cancelled the operation.
    #[error("{operation}: cancelled")]
    Cancelled {
        /// Cancelled operation.
        operation: &'static str,
    },
}

impl FileError {
    /// Create an input validation error.
    #[must_use]
    pub fn validation(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InputValidationFailed {
            operation,
            reason: reason.into(),
        }
    }

    /// Name of the operation that failed.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::InputValidationFailed { operation, .. }
            | Self::StorageWriteFailed { operation, .. }
            | Self::StorageReadFailed { operation, .. }
            | Self::StorageDeleteFailed { operation, .. }
            | Self::MetadataNotFound { operation, .. }
            | Self::MetadataReadFailed { operation, .. }
            | Self::MetadataWriteFailed { operation, .. }
            | Self::UrlIssuanceFailed { operation, .. }
            | Self::Cancelled { operation } => operation,
        }
    }

    /// Whether the failure is a name or id collision.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::StorageWriteFailed {
                source: StorageError::AlreadyExists { .. },
                ..
            } | Self::MetadataWriteFailed {
                source: RepositoryError::Duplicate(_),
                ..
            }
        )
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        let message = err.to_string();
        match err {
            FileError::InputValidationFailed { .. } => Self::Validation(message),
            FileError::MetadataNotFound { .. } => Self::NotFound(message),
            FileError::StorageReadFailed {
                source: StorageError::NotFound { .. },
                ..
            } => Self::NotFound(message),
            ref e if e.is_conflict() => Self::Conflict(message),
            FileError::StorageWriteFailed { .. }
            | FileError::StorageReadFailed { .. }
            | FileError::StorageDeleteFailed { .. }
            | FileError::UrlIssuanceFailed { .. } => Self::Storage(message),
            FileError::MetadataReadFailed { .. } | FileError::MetadataWriteFailed { .. } => {
                Self::Database(message)
            }
            FileError::Cancelled { .. } => Self::Unavailable(message),
        }
    }
}

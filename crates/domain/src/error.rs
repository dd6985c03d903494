//! Unified error types for the domain layer
//!
//! Provides a common error type for domain operations that do not have a more
//! specific error of their own (path resolution has `PathError`).

use thiserror::Error;

use crate::path::PathError;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid ID format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A typed record could not be read from the save tree
    #[error("Malformed record at {path}: {reason}")]
    MalformedRecord { path: String, reason: String },

    /// Path resolution failed
    #[error(transparent)]
    Path(#[from] PathError),
}

impl DomainError {
    /// Creates a validation error for rule violations.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid ID error
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn malformed(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

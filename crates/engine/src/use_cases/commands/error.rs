//! Per-command execution failures.
//!
//! An execution error drops one command; the rest of the batch still runs.

use thiserror::Error;
use tianji_domain::PathError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("cannot push onto {path}: target is not a sequence")]
    NotASequence { path: String },

    #[error("cannot add to {path}: target is not a number")]
    NotANumber { path: String },

    #[error("cannot add to {path}: value is not a number")]
    NonNumericOperand { path: String },

    #[error("calendar update refused: {reason}")]
    Calendar { reason: String },

    #[error(transparent)]
    Path(#[from] PathError),
}

impl ExecutionError {
    pub fn calendar(reason: impl std::fmt::Display) -> Self {
        Self::Calendar {
            reason: reason.to_string(),
        }
    }
}

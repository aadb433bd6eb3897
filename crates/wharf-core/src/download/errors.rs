//! Transfer command error types.
//!
//! These errors are designed to be serializable and not depend on external
//! error types, so they can cross IPC boundaries intact. Transfer failures
//! themselves are not represented here: the engine reports those through a
//! `Failed` event with a reason string, recoverable only via an explicit
//! retry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::TaskId;

/// Error type for commands issued to the transfer engine.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineError {
    /// The request shape is invalid (e.g. malformed URL). Surfaced
    /// immediately to the caller, never retried automatically.
    #[error("Invalid request: {message}")]
    Validation {
        /// What was wrong with the request.
        message: String,
    },

    /// The transfer engine cannot be reached; the command failed fast and
    /// the local store is unchanged.
    #[error("Engine unavailable: {message}")]
    Unavailable {
        /// Detailed error message.
        message: String,
    },

    /// The command referenced an id the engine no longer tracks.
    #[error("Task not found: {id}")]
    TaskNotFound {
        /// The unknown task id.
        id: String,
    },

    /// General/uncategorized engine error.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl EngineError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an engine-unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a task-not-found error.
    #[must_use]
    pub fn task_not_found(id: &TaskId) -> Self {
        Self::TaskNotFound {
            id: id.to_string(),
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this is a missing-task error.
    ///
    /// Bulk operations treat these as benign no-ops; single-task
    /// operations surface them.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound { .. })
    }

    /// Convert to a user-friendly message.
    ///
    /// A failed command reads as an operation failure, distinct from a
    /// bulk command that simply matched nothing (count 0).
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => format!("Request rejected: {message}"),
            Self::Unavailable { message } => {
                format!("The transfer engine is not reachable: {message}")
            }
            Self::TaskNotFound { id } => {
                format!("Transfer '{id}' is no longer tracked by the engine.")
            }
            Self::Other { message } => message.clone(),
        }
    }
}

/// Convenience result type for engine commands.
pub type EngineResult<T> = Result<T, EngineError>;

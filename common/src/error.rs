// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use thiserror::Error;

/// Failure reported by a [`crate::TaskStore`] call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached, or the call timed out.
    #[error("task store unavailable: {0}")]
    Unavailable(String),

    #[error("task {0} not found in store")]
    NotFound(String),

    /// Any other backend failure (permission, constraint, corrupt row...).
    #[error("task store failure: {0}")]
    Backend(String),
}

/// Errors surfaced by the board engine.
///
/// Everything except [`BoardError::Store`] is a validation error: the
/// operation was rejected before any local or remote mutation happened.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("unknown status label: {0:?}")]
    UnknownStatus(String),

    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    #[error("task {0} is not on the board")]
    TaskNotFound(String),

    #[error("invalid {field}: {reason}")]
    InvalidTask { field: &'static str, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BoardError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTask {
            field,
            reason: reason.into(),
        }
    }

    /// True for caller mistakes, false for store failures.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

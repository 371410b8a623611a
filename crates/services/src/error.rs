//! Shared error types for the services crate.

use serde::Serialize;
use thiserror::Error;

use quiz_core::machine::MachineError;
use quiz_core::model::QuestionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Coarse error class reported to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// The store could not be reached or refused the operation.
    StoreUnavailable,
    /// Persisted state or content contradicts the quiz rules.
    InvariantViolation,
}

/// Errors raised while handling one action.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Machine(#[from] MachineError),
    #[error(transparent)]
    InvalidContent(#[from] QuestionError),
}

impl QuizError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuizError::Storage(StorageError::Connection(_)) => ErrorKind::StoreUnavailable,
            QuizError::Storage(_) | QuizError::Machine(_) | QuizError::InvalidContent(_) => {
                ErrorKind::InvariantViolation
            }
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

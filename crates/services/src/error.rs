//! Shared error types for the services crate.

use thiserror::Error;

use practice_core::model::SessionStateError;
use storage::repository::StorageError;
use storage::rest::RestConfigError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuestionBankLoader`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadError {
    /// Neither question table produced a usable question.
    #[error("no questions available (tried {tables:?}): {last_error}")]
    NoQuestionsAvailable {
        tables: Vec<String>,
        last_error: String,
    },
}

/// Errors emitted by the progress persistence protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SaveError {
    #[error("sign in to save your results")]
    NotAuthenticated,

    /// Every row shape was refused by the progress table.
    #[error("could not save results after {attempts} attempts: {last_error}")]
    SchemaMismatch {
        attempts: usize,
        last_error: String,
        cached_locally: bool,
    },

    /// The progress store could not be reached at all.
    #[error("progress store unavailable after {attempts} attempts: {message}")]
    Unavailable {
        attempts: usize,
        message: String,
        cached_locally: bool,
    },

    #[error(transparent)]
    Session(#[from] SessionStateError),
}

impl SaveError {
    /// Last raw backend message, when the backend produced one.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        match self {
            SaveError::SchemaMismatch { last_error, .. } => Some(last_error),
            SaveError::Unavailable { message, .. } => Some(message),
            _ => None,
        }
    }

    /// True when the result was kept in the on-device cache instead.
    #[must_use]
    pub fn cached_locally(&self) -> bool {
        match self {
            SaveError::SchemaMismatch { cached_locally, .. }
            | SaveError::Unavailable { cached_locally, .. } => *cached_locally,
            _ => false,
        }
    }
}

/// Errors emitted while reading progress history. Callers absorb these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("history unavailable: {0}")]
    Unavailable(#[from] StorageError),
}

/// Errors emitted by `PracticeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error(transparent)]
    Session(#[from] SessionStateError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    RestConfig(#[from] RestConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

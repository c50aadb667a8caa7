//! Error types for the SQLite store

use egonet_core::StoreError;
use thiserror::Error;

/// SQLite store error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database could not be opened or closed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(String),

    /// Schema/migration error
    #[error("Schema error: {0}")]
    Schema(String),

    /// A chunk of one ingest step failed; the chunk's transaction rolled back
    #[error("Write failed during {step}: {source}")]
    Write {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A feature assignment has no stored feature id
    #[error("Feature '{group}:{name}' has no stored identifier")]
    UnresolvedFeature { group: String, name: String },

    /// Blocking task failed to complete
    #[error("Task error: {0}")]
    Task(String),

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for SQLite operations
pub type SqliteResult<T> = Result<T, SqliteError>;

impl SqliteError {
    pub(crate) fn write(step: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Write { step, source }
    }
}

impl From<SqliteError> for StoreError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Connection(msg) => Self::Connection(msg),
            SqliteError::Query(msg) => Self::Query(msg),
            SqliteError::Schema(msg) => Self::Schema(msg),
            SqliteError::Write { step, source } => Self::write(step, source.to_string()),
            SqliteError::UnresolvedFeature { group, name } => {
                Self::UnresolvedFeature { group, name }
            }
            SqliteError::Task(msg) => Self::Internal(msg),
            SqliteError::Rusqlite(e) => Self::Internal(e.to_string()),
        }
    }
}

use egonet_core::StoreError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration for the SurrealDB backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurrealDbConfig {
    pub namespace: String,
    pub database: String,
    /// RocksDB directory; `None` keeps everything in memory
    pub path: Option<PathBuf>,
    /// Records deleted per statement while wiping
    pub wipe_batch_size: usize,
}

impl Default for SurrealDbConfig {
    fn default() -> Self {
        Self {
            namespace: "egonet".to_string(),
            database: "gplus".to_string(),
            path: None,
            wipe_batch_size: 10_000,
        }
    }
}

impl SurrealDbConfig {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// SurrealDB store error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Write failed during {step}: {message}")]
    Write {
        step: &'static str,
        message: String,
    },

    /// A SurrealDB value could not be turned into plain JSON
    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Re-tag a query failure as a failed ingest step
    pub(crate) fn during(self, step: &'static str) -> Self {
        match self {
            DbError::Query(message) | DbError::Conversion(message) => {
                DbError::Write { step, message }
            }
            other => other,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Connection(msg) | DbError::InvalidConfig(msg) => Self::Connection(msg),
            DbError::Schema(msg) => Self::Schema(msg),
            DbError::Query(msg) | DbError::Conversion(msg) => Self::Query(msg),
            DbError::Write { step, message } => Self::Write { step, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_retagged_as_write() {
        let err = DbError::Query("index violation".into()).during("follows");
        assert_eq!(
            StoreError::from(err),
            StoreError::write("follows", "index violation")
        );
    }

    #[test]
    fn test_connection_errors_stay_fatal() {
        let err = DbError::Connection("lock held".into()).during("users");
        assert!(StoreError::from(err).is_fatal_to_run());
    }
}

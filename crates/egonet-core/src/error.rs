//! Store error types shared by every backend

use thiserror::Error;

/// Error type for store operations (ingest, wipe, query)
///
/// Uniqueness conflicts during upserts never show up here: both backends
/// treat "already present" as success. Everything else does.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Store unreachable or could not be opened; fatal to the whole run
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema setup failed
    #[error("Schema error: {0}")]
    Schema(String),

    /// A chunked write failed; fatal to the current ego-network import
    #[error("Write failed during {step}: {message}")]
    Write {
        step: &'static str,
        message: String,
    },

    /// Query execution failed
    #[error("Query error: {0}")]
    Query(String),

    /// A feature assignment could not be mapped to a stored identifier
    #[error("Feature '{group}:{name}' has no stored identifier")]
    UnresolvedFeature { group: String, name: String },

    /// Anything else (task join failures, invariant breaks)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Create a write error for the given ingest step
    pub fn write<S: Into<String>>(step: &'static str, msg: S) -> Self {
        Self::Write {
            step,
            message: msg.into(),
        }
    }

    /// Create a query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        Self::Query(msg.into())
    }

    /// Whether the error should stop the whole run rather than one import
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Schema(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_names_step() {
        let err = StoreError::write("users", "disk full");
        assert_eq!(err.to_string(), "Write failed during users: disk full");
        assert!(!err.is_fatal_to_run());
    }

    #[test]
    fn test_connection_errors_are_fatal() {
        assert!(StoreError::Connection("refused".into()).is_fatal_to_run());
        assert!(!StoreError::query("syntax").is_fatal_to_run());
    }
}

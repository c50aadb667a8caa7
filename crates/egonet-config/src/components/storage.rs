//! Storage backend configuration
//!
//! One section per backend: `[graph]` for the embedded SurrealDB store and
//! `[relational]` for the SQLite store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Graph store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// On-disk database directory; `None` keeps the graph in memory
    pub path: Option<PathBuf>,
    pub namespace: String,
    pub database: String,
    /// Records deleted per statement while wiping
    pub wipe_batch_size: usize,
}

/// Relational store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationalConfig {
    /// SQLite database file; `:memory:` for an in-memory database
    pub path: PathBuf,
    pub wal_mode: bool,
    pub busy_timeout_ms: u32,
    /// SQLite `cache_size` pragma (negative values are KiB)
    pub cache_size: i64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: None,
            namespace: "egonet".to_string(),
            database: "gplus".to_string(),
            wipe_batch_size: 10_000,
        }
    }
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./egonet.db"),
            wal_mode: true,
            busy_timeout_ms: 5000,
            cache_size: -64_000,
        }
    }
}

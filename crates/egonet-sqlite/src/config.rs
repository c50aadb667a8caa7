//! SQLite connection settings

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Database file, or `:memory:`
    pub path: PathBuf,
    pub wal_mode: bool,
    /// Always on for ingestion: dangling writes must fail
    pub foreign_keys: bool,
    pub busy_timeout_ms: u32,
    /// `PRAGMA cache_size`; negative values are KiB
    pub cache_size: i64,
    pub mmap_size: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./egonet.db"),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5000,
            cache_size: -64_000,
            mmap_size: 0,
        }
    }
}

impl SqliteConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// In-memory database, used by tests
    pub fn memory() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            wal_mode: false,
            ..Default::default()
        }
    }

    pub fn is_memory(&self) -> bool {
        self.path.to_str() == Some(":memory:")
    }
}

//! SQLite connection handle
//!
//! A single `Arc<Mutex<Connection>>` per store. Ingestion is one writer at a
//! time, so there is nothing for a pool to share out.

use crate::config::SqliteConfig;
use crate::error::{SqliteError, SqliteResult};
use crate::schema;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared handle to the store's one connection
#[derive(Clone)]
pub struct SqlitePool {
    conn: Arc<Mutex<Connection>>,
    config: SqliteConfig,
}

impl SqlitePool {
    /// Open the file (or memory database), set pragmas, migrate
    pub fn new(config: SqliteConfig) -> SqliteResult<Self> {
        let conn = open_connection(&config)?;
        for pragma in pragmas(&config) {
            conn.execute_batch(&pragma)?;
        }
        schema::apply_migrations(&conn)?;
        info!(path = ?config.path, wal = config.wal_mode, "Opened relational store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    pub fn memory() -> SqliteResult<Self> {
        Self::new(SqliteConfig::memory())
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Run `f` while holding the connection lock
    pub fn with_connection<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        f(&self.conn.lock())
    }

    /// Like [`with_connection`](Self::with_connection), for callers that open transactions
    pub fn with_connection_mut<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&mut Connection) -> SqliteResult<T>,
    {
        f(&mut self.conn.lock())
    }

    /// Close the connection; fails while another clone of the handle is alive
    pub fn close(self) -> SqliteResult<()> {
        let conn = Arc::try_unwrap(self.conn)
            .map_err(|_| {
                SqliteError::Connection("connection is still shared; cannot close".to_string())
            })?
            .into_inner();
        conn.close()
            .map_err(|(_, e)| SqliteError::Connection(format!("Failed to close: {}", e)))?;
        debug!(path = ?self.config.path, "Closed relational store");
        Ok(())
    }
}

fn open_connection(config: &SqliteConfig) -> SqliteResult<Connection> {
    if config.is_memory() {
        return Connection::open_in_memory()
            .map_err(|e| SqliteError::Connection(format!("in-memory database: {}", e)));
    }
    if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            SqliteError::Connection(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }
    Connection::open(&config.path)
        .map_err(|e| SqliteError::Connection(format!("{}: {}", config.path.display(), e)))
}

/// Pragma statements for `config`, in the order they are applied
fn pragmas(config: &SqliteConfig) -> Vec<String> {
    let mut out = Vec::new();
    if config.wal_mode {
        out.push("PRAGMA journal_mode = WAL".to_string());
        out.push("PRAGMA synchronous = NORMAL".to_string());
    }
    if config.foreign_keys {
        out.push("PRAGMA foreign_keys = ON".to_string());
    }
    out.push(format!("PRAGMA busy_timeout = {}", config.busy_timeout_ms));
    out.push(format!("PRAGMA cache_size = {}", config.cache_size));
    if config.mmap_size > 0 {
        out.push(format!("PRAGMA mmap_size = {}", config.mmap_size));
    }
    out.push("PRAGMA temp_store = MEMORY".to_string());
    out
}

//! SQLite relational store for egonet
//!
//! Holds ego networks in a normalized schema (nodes, egos, users, circles,
//! circle members, feature groups and names with surrogate ids, node features
//! and edges) with foreign keys enforced on every statement.
//!
//! ## Features
//!
//! - **RelationalIngestor**: chunked, idempotent, dependency-ordered import
//! - **WAL Mode**: optional write-ahead logging for file databases
//! - **Thread Safety**: `Arc<Mutex<Connection>>` driven from `spawn_blocking`
//! - **Query set**: the S1-S6 / C1-C4 benchmark queries in SQL
//!
//! ## Usage
//!
//! ```rust,ignore
//! use egonet_core::EgoNetworkStore;
//! use egonet_sqlite::{RelationalIngestor, SqliteConfig};
//!
//! let store = RelationalIngestor::open(SqliteConfig::new("./egonet.db"), 50_000)?;
//! let stats = store.ingest_ego_network(network).await?;
//! store.close()?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod ingest;
pub mod queries;
pub mod schema;

pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use error::{SqliteError, SqliteResult};
pub use ingest::RelationalIngestor;
pub use queries::{complex_queries, simple_queries};

//! SurrealDB property-graph store for egonet
//!
//! Egos, users, circles, feature groups and feature names are records keyed
//! by their natural ids; `owns`, `owns_feat`, `has_feat`, `follows` and
//! `part_of` are `RELATE` edges between them.
//!
//! ## Features
//!
//! - **GraphIngestor**: chunked, idempotent, dependency-ordered import
//! - **Batched wipe**: bounded delete statements, relations first
//! - **Embedded engines**: in-memory by default, RocksDB with `rocksdb`
//! - **Query set**: the S1-S6 / C1-C4 benchmark queries in SurrealQL
//!
//! ## Usage
//!
//! ```rust,ignore
//! use egonet_core::EgoNetworkStore;
//! use egonet_surrealdb::{GraphIngestor, SurrealDbConfig};
//!
//! let store = GraphIngestor::open(SurrealDbConfig::memory(), 50_000).await?;
//! let stats = store.ingest_ego_network(network).await?;
//! store.close()?;
//! ```

pub mod ingest;
pub mod queries;
pub mod schema;
pub mod surreal_client;
pub mod types;

pub use ingest::GraphIngestor;
pub use queries::{complex_queries, simple_queries};
pub use schema::apply_graph_schema;
pub use surreal_client::SurrealClient;
pub use types::{DbError, DbResult, SurrealDbConfig};

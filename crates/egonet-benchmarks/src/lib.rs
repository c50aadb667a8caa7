//! Fixtures shared by the egonet benchmarks
//!
//! ```bash
//! cargo bench -p egonet-benchmarks
//! cargo bench -p egonet-benchmarks --bench ingest_comparison
//! ```

use egonet_core::test_support::synthetic_network;
use egonet_core::EgoNetwork;
use egonet_sqlite::{RelationalIngestor, SqliteConfig};
use egonet_surrealdb::{GraphIngestor, SurrealDbConfig};
use std::sync::Arc;
use tempfile::TempDir;

/// Users per synthetic ego network, smallest first
pub const NETWORK_SIZES: [usize; 3] = [50, 250, 1000];

/// Batch sizes compared by the ingest benchmark
pub const BATCH_SIZES: [usize; 3] = [100, 1_000, 50_000];

/// Features per synthetic ego network
pub const FEATURES: usize = 16;

pub fn network(users: usize) -> Arc<EgoNetwork> {
    Arc::new(synthetic_network("bench", users, FEATURES))
}

/// Fresh in-memory graph store
pub async fn graph_store(batch_size: usize) -> GraphIngestor {
    let config = SurrealDbConfig {
        namespace: "bench".to_string(),
        ..SurrealDbConfig::memory()
    };
    GraphIngestor::open(config, batch_size)
        .await
        .expect("Failed to open graph store")
}

/// Fresh file-backed relational store; keep the directory alive with the store
pub fn relational_store(batch_size: usize) -> (TempDir, RelationalIngestor) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = RelationalIngestor::open(SqliteConfig::new(dir.path().join("bench.db")), batch_size)
        .expect("Failed to open relational store");
    (dir, store)
}

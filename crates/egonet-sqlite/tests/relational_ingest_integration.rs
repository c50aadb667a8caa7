//! End-to-end relational import from files on disk

use egonet_core::dataset::{discover_ego_ids, EgoNetworkFiles};
use egonet_core::test_support::{synthetic_network, write_fixture_dataset};
use egonet_core::{EgoNetwork, EgoNetworkStore};
use egonet_sqlite::{RelationalIngestor, SqliteConfig};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_import_from_files_into_file_database() {
    let data = TempDir::new().unwrap();
    write_fixture_dataset(data.path()).unwrap();
    let db = TempDir::new().unwrap();

    let store = RelationalIngestor::open(SqliteConfig::new(db.path().join("egonet.db")), 1000)
        .expect("open store");

    for ego_id in discover_ego_ids(data.path()).unwrap() {
        let network = EgoNetwork::load(&EgoNetworkFiles::in_dir(data.path(), &ego_id)).unwrap();
        store.ingest_ego_network(Arc::new(network)).await.unwrap();
    }

    let counts = store.entity_counts().await.unwrap();
    assert_eq!(counts["user_node"], 3);
    assert_eq!(counts["circle_member"], 2);
    store.close().unwrap();

    // reopening keeps the data and skips the applied migration
    let reopened =
        RelationalIngestor::open(SqliteConfig::new(db.path().join("egonet.db")), 1000).unwrap();
    assert_eq!(reopened.entity_counts().await.unwrap(), counts);
}

#[tokio::test]
async fn test_batch_size_does_not_change_content() {
    let network = Arc::new(synthetic_network("7", 230, 9));
    let mut snapshots = Vec::new();

    for batch_size in [1, 100, 50_000] {
        let store = RelationalIngestor::open(SqliteConfig::memory(), batch_size).unwrap();
        store.ingest_ego_network(network.clone()).await.unwrap();
        snapshots.push(store.entity_counts().await.unwrap());
    }

    assert_eq!(snapshots[0], snapshots[1]);
    assert_eq!(snapshots[1], snapshots[2]);
    assert_eq!(snapshots[0]["user_node"], 230);
}

#[tokio::test]
async fn test_chunk_count_follows_batch_size() {
    let network = Arc::new(synthetic_network("8", 10, 2));
    let small = RelationalIngestor::open(SqliteConfig::memory(), 1).unwrap();
    let large = RelationalIngestor::open(SqliteConfig::memory(), 1000).unwrap();

    let small_stats = small.ingest_ego_network(network.clone()).await.unwrap();
    let large_stats = large.ingest_ego_network(network).await.unwrap();

    assert_eq!(small_stats.users, large_stats.users);
    assert!(small_stats.chunks > large_stats.chunks);
}

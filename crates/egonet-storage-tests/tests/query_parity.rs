//! Both stores answer the shared questions identically

use egonet_core::test_support::{
    fixture_network, mutual_follows_network, shared_users_networks, FIXTURE_AVG_FEATURES,
    FIXTURE_EDGE_COUNT, FIXTURE_EGO_ID, FIXTURE_USERS,
};
use egonet_core::{EgoNetwork, EgoNetworkStore};
use egonet_sqlite::{RelationalIngestor, SqliteConfig};
use egonet_storage_tests::{
    dump_contents, normalized, per_ego, run_named, GRAPH_DUMP, RELATIONAL_DUMP,
};
use egonet_surrealdb::{GraphIngestor, SurrealDbConfig};
use std::sync::Arc;

/// Node counts by label differ by construction: only the graph has circle and feature nodes
const GRAPH_ONLY_SHAPE: &str = "S1_nodes_by_label";

async fn loaded_with(networks: Vec<EgoNetwork>) -> (GraphIngestor, RelationalIngestor) {
    let graph = GraphIngestor::open(SurrealDbConfig::memory(), 100)
        .await
        .unwrap();
    let relational = RelationalIngestor::open(SqliteConfig::memory(), 100).unwrap();

    for network in networks {
        let network = Arc::new(network);
        let (g, r) = tokio::try_join!(
            graph.ingest_ego_network(network.clone()),
            relational.ingest_ego_network(network)
        )
        .unwrap();
        assert_eq!(g.users, r.users);
        assert_eq!(g.follows, r.follows);
    }
    (graph, relational)
}

async fn loaded() -> (GraphIngestor, RelationalIngestor) {
    loaded_with(vec![fixture_network()]).await
}

/// Run every shared query except S1 on both stores and compare normalized rows
async fn assert_all_queries_agree(graph: &GraphIngestor, relational: &RelationalIngestor) {
    let sets = [
        (egonet_surrealdb::queries::SIMPLE, egonet_sqlite::queries::SIMPLE),
        (egonet_surrealdb::queries::COMPLEX, egonet_sqlite::queries::COMPLEX),
    ];
    for (graph_set, relational_set) in sets {
        for (name, _) in graph_set.iter().filter(|(n, _)| *n != GRAPH_ONLY_SHAPE) {
            let g = normalized(&run_named(graph, graph_set, name).await);
            let r = normalized(&run_named(relational, relational_set, name).await);
            assert_eq!(g, r, "{name} differs between graph and relational");
        }
    }
}

#[tokio::test]
async fn test_users_per_ego_match() {
    let (graph, relational) = loaded().await;
    let name = "S2_users_per_ego";

    let g = per_ego(&run_named(&graph, egonet_surrealdb::queries::SIMPLE, name).await, "user_count");
    let r = per_ego(&run_named(&relational, egonet_sqlite::queries::SIMPLE, name).await, "user_count");

    assert_eq!(g, r);
    assert_eq!(g, vec![(FIXTURE_EGO_ID.to_string(), FIXTURE_USERS as f64)]);
}

#[tokio::test]
async fn test_edges_per_ego_match() {
    let (graph, relational) = loaded().await;
    let name = "S3_edges_per_ego";

    let g = per_ego(&run_named(&graph, egonet_surrealdb::queries::SIMPLE, name).await, "edge_count");
    let r = per_ego(&run_named(&relational, egonet_sqlite::queries::SIMPLE, name).await, "edge_count");

    assert_eq!(g, r);
    assert_eq!(g, vec![(FIXTURE_EGO_ID.to_string(), FIXTURE_EDGE_COUNT as f64)]);
}

#[tokio::test]
async fn test_average_features_per_node_match() {
    let (graph, relational) = loaded().await;
    let name = "S5_avg_features_per_node";

    let g = run_named(&graph, egonet_surrealdb::queries::SIMPLE, name).await;
    let r = run_named(&relational, egonet_sqlite::queries::SIMPLE, name).await;

    let avg = |rows: &[serde_json::Value]| rows[0]["avg_features_per_node"].as_f64().unwrap();
    assert!((avg(&g) - FIXTURE_AVG_FEATURES).abs() < 1e-9);
    assert!((avg(&r) - FIXTURE_AVG_FEATURES).abs() < 1e-9);
}

#[tokio::test]
async fn test_every_query_matches_on_fixture() {
    let (graph, relational) = loaded().await;
    assert_all_queries_agree(&graph, &relational).await;
}

#[tokio::test]
async fn test_every_query_matches_with_mutual_follows() {
    let (graph, relational) = loaded_with(vec![fixture_network(), mutual_follows_network()]).await;
    assert_all_queries_agree(&graph, &relational).await;

    // the comparison above is only meaningful if these return rows
    for name in ["C2_high_degree_users", "C4_mutual_follows"] {
        let rows = run_named(&relational, egonet_sqlite::queries::COMPLEX, name).await;
        assert!(!rows.is_empty(), "{name} returned nothing");
    }
}

#[tokio::test]
async fn test_shared_users_count_once_per_ego() {
    let (graph, relational) = loaded_with(shared_users_networks()).await;
    let name = "S2_users_per_ego";

    let g = per_ego(&run_named(&graph, egonet_surrealdb::queries::SIMPLE, name).await, "user_count");
    let r = per_ego(&run_named(&relational, egonet_sqlite::queries::SIMPLE, name).await, "user_count");

    assert_eq!(g, r);
    assert_eq!(g, vec![("e1".to_string(), 2.0), ("e2".to_string(), 2.0)]);
    assert_all_queries_agree(&graph, &relational).await;
}

#[tokio::test]
async fn test_stored_contents_match() {
    let (graph, relational) = loaded_with(vec![
        fixture_network(),
        mutual_follows_network(),
        shared_users_networks().remove(0),
    ])
    .await;

    let g = dump_contents(&graph, &GRAPH_DUMP).await;
    let r = dump_contents(&relational, &RELATIONAL_DUMP).await;
    assert_eq!(g, r);
    assert_eq!(g.edges.len(), 2 + 7 + 2);
}

#[test]
fn test_query_sets_share_names() {
    let names = |set: &[(&str, &str)]| set.iter().map(|(n, _)| n.to_string()).collect::<Vec<_>>();

    assert_eq!(
        names(egonet_surrealdb::queries::SIMPLE),
        names(egonet_sqlite::queries::SIMPLE)
    );
    assert_eq!(
        names(egonet_surrealdb::queries::COMPLEX),
        names(egonet_sqlite::queries::COMPLEX)
    );
}

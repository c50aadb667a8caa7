//! Contract checks every [`EgoNetworkStore`] must pass
//!
//! Each check takes a freshly opened, empty store so the same assertions run
//! against SQLite and SurrealDB alike.
//!
//! ```bash
//! cargo test -p egonet-storage-tests
//! cargo test -p egonet-storage-tests --no-default-features --features sqlite
//! ```

use egonet_core::test_support::{fixture_network, synthetic_network};
use egonet_core::{EgoNetworkStore, QueryBackend};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type Counts = BTreeMap<String, u64>;

/// Importing the same network twice leaves every count unchanged
pub async fn check_reimport_is_idempotent<S: EgoNetworkStore>(store: &S) {
    let network = Arc::new(fixture_network());

    store.ingest_ego_network(network.clone()).await.unwrap();
    let first = store.entity_counts().await.unwrap();
    assert!(first.values().any(|c| *c > 0), "nothing was written");

    let stats = store.ingest_ego_network(network).await.unwrap();
    assert_eq!(
        store.entity_counts().await.unwrap(),
        first,
        "{} changed on re-import",
        store.backend_name()
    );
    // submissions are reported even when absorbed
    assert_eq!(stats.users, 3);
}

/// Wipe leaves every table empty and a later import starts from scratch
pub async fn check_wipe_then_reimport<S: EgoNetworkStore>(store: &S) {
    let network = Arc::new(synthetic_network("42", 25, 4));

    store.ingest_ego_network(network.clone()).await.unwrap();
    let before = store.entity_counts().await.unwrap();

    store.wipe().await.unwrap();
    let empty = store.entity_counts().await.unwrap();
    assert!(empty.values().all(|c| *c == 0), "{empty:?}");

    store.ingest_ego_network(network).await.unwrap();
    assert_eq!(store.entity_counts().await.unwrap(), before);
}

/// A query result with every value rendered as text
pub type Rows = Vec<BTreeMap<String, String>>;

/// Render rows so both backends compare equal: numbers to six decimals, rows sorted
pub fn normalized(rows: &[Value]) -> Rows {
    let mut out: Rows = rows
        .iter()
        .map(|row| {
            row.as_object()
                .map(|object| {
                    object
                        .iter()
                        .map(|(k, v)| (k.clone(), cell(v)))
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();
    out.sort();
    out
}

fn cell(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("{:.6}", n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Queries that list stored content by natural key, one per relationship kind
pub struct DumpQueries {
    /// `(ego, node)` for every user of every ego network
    pub users: &'static str,
    /// `(ego, src, dst)` for every user-to-user edge
    pub edges: &'static str,
    /// `(node, feature_group, feature_name)` for every feature assignment
    pub features: &'static str,
    /// `(ego, circle, node)` for every circle membership
    pub memberships: &'static str,
}

#[cfg(feature = "sqlite")]
pub const RELATIONAL_DUMP: DumpQueries = DumpQueries {
    users: "SELECT ego_id AS ego, node_id AS node FROM user_node",
    edges: "SELECT ego_id AS ego, src_id AS src, dst_id AS dst FROM edge",
    features: "SELECT nf.node_id AS node, fg.group_name AS feature_group, fn.name AS feature_name
               FROM node_feature nf
               JOIN feature_name fn ON nf.feature_id = fn.feature_id
               JOIN feature_group fg ON fn.group_id = fg.group_id",
    memberships: "SELECT ego_id AS ego, circle_id AS circle, node_id AS node FROM circle_member",
};

#[cfg(feature = "surrealdb")]
pub const GRAPH_DUMP: DumpQueries = DumpQueries {
    users: "SELECT ego, out.key AS node FROM follows WHERE kind = 'ego'",
    edges: "SELECT ego, in.key AS src, out.key AS dst FROM follows WHERE kind = 'user'",
    features: "SELECT in.key AS node, out.group_name AS feature_group, out.name AS feature_name
               FROM has_feat",
    memberships: "SELECT out.ego AS ego, out.name AS circle, in.key AS node FROM part_of",
};

/// Everything a store holds, by natural key, sorted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contents {
    pub users: Rows,
    pub edges: Rows,
    pub features: Rows,
    pub memberships: Rows,
}

pub async fn dump_contents(backend: &dyn QueryBackend, queries: &DumpQueries) -> Contents {
    Contents {
        users: rows(backend, queries.users).await,
        edges: rows(backend, queries.edges).await,
        features: rows(backend, queries.features).await,
        memberships: rows(backend, queries.memberships).await,
    }
}

async fn rows(backend: &dyn QueryBackend, text: &str) -> Rows {
    normalized(&backend.run_query(text).await.unwrap())
}

/// Counts and contents after importing `synthetic_network` through a store built by `open`
pub async fn contents_for_batch_size<S, F, Fut>(
    open: F,
    batch_size: usize,
    queries: &DumpQueries,
) -> (Counts, Contents)
where
    S: EgoNetworkStore + QueryBackend,
    F: FnOnce(usize) -> Fut,
    Fut: std::future::Future<Output = S>,
{
    let store = open(batch_size).await;
    store
        .ingest_ego_network(Arc::new(synthetic_network("7", 30, 5)))
        .await
        .unwrap();
    let counts = store.entity_counts().await.unwrap();
    let contents = dump_contents(&store, queries).await;
    assert_eq!(contents.edges.len() as u64, 30 + 5, "ring plus chords");
    (counts, contents)
}

/// Rows of the query named `name` from a `(name, text)` set
pub async fn run_named(backend: &dyn QueryBackend, set: &[(&str, &str)], name: &str) -> Vec<Value> {
    let (_, text) = set
        .iter()
        .find(|(n, _)| *n == name)
        .unwrap_or_else(|| panic!("no query named {name}"));
    backend.run_query(text).await.unwrap()
}

/// Pull `field` from every row as `(ego_id, number)`
pub fn per_ego(rows: &[Value], field: &str) -> Vec<(String, f64)> {
    rows.iter()
        .map(|row| {
            (
                row["ego_id"].as_str().unwrap_or_default().to_string(),
                row[field].as_f64().unwrap_or(f64::NAN),
            )
        })
        .collect()
}

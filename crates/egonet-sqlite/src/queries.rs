//! Benchmark query set for the relational store
//!
//! Query names and output column aliases match the graph store's set so
//! results can be compared row for row.

use crate::error::{SqliteError, SqliteResult};
use crate::ingest::RelationalIngestor;
use async_trait::async_trait;
use egonet_core::{Complexity, QueryBackend, QuerySet, StoreResult};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Map, Value};

pub const SIMPLE: &[(&str, &str)] = &[
    (
        "S1_nodes_by_label",
        "SELECT node_type AS label, COUNT(*) AS count
         FROM node
         GROUP BY node_type
         ORDER BY label",
    ),
    (
        "S2_users_per_ego",
        "SELECT ego_id, COUNT(*) AS user_count
         FROM user_node
         GROUP BY ego_id
         ORDER BY ego_id",
    ),
    (
        "S3_edges_per_ego",
        "SELECT ego_id, COUNT(*) AS edge_count
         FROM edge
         GROUP BY ego_id
         ORDER BY ego_id",
    ),
    (
        "S4_circles_per_ego",
        "SELECT ego_id, COUNT(*) AS circle_count
         FROM circle
         GROUP BY ego_id
         ORDER BY ego_id",
    ),
    (
        "S5_avg_features_per_node",
        "SELECT AVG(feature_count) AS avg_features_per_node
         FROM (
             SELECT node_id, COUNT(*) AS feature_count
             FROM node_feature
             GROUP BY node_id
         )",
    ),
    (
        "S6_top_features",
        "SELECT fg.group_name AS feature_group, fn.name AS feature_name, COUNT(*) AS usage_count
         FROM node_feature nf
         JOIN feature_name fn ON nf.feature_id = fn.feature_id
         JOIN feature_group fg ON fn.group_id = fg.group_id
         GROUP BY fn.feature_id
         ORDER BY usage_count DESC, feature_group, feature_name
         LIMIT 10",
    ),
];

pub const COMPLEX: &[(&str, &str)] = &[
    (
        "C1_avg_circle_size",
        "SELECT ego_id, AVG(member_count) AS avg_circle_size
         FROM (
             SELECT ego_id, circle_id, COUNT(*) AS member_count
             FROM circle_member
             GROUP BY ego_id, circle_id
         )
         GROUP BY ego_id
         ORDER BY ego_id",
    ),
    (
        "C2_high_degree_users",
        "WITH degrees AS (
             SELECT ego_id, src_id AS user_id, COUNT(*) AS degree
             FROM edge
             GROUP BY ego_id, src_id
         )
         SELECT d.ego_id AS ego_id, d.user_id AS user_id, d.degree AS degree
         FROM degrees d
         WHERE d.degree > (SELECT AVG(a.degree) FROM degrees a WHERE a.ego_id = d.ego_id)
         ORDER BY d.ego_id, d.degree DESC, d.user_id",
    ),
    (
        "C3_feature_overlap",
        "SELECT ego_id, circle_id, COUNT(*) AS shared_features
         FROM (
             SELECT cm.ego_id, cm.circle_id, nf.feature_id
             FROM circle_member cm
             JOIN node_feature nf ON nf.node_id = cm.node_id
             GROUP BY cm.ego_id, cm.circle_id, nf.feature_id
             HAVING COUNT(*) >= 2
         )
         GROUP BY ego_id, circle_id
         ORDER BY ego_id, circle_id",
    ),
    (
        "C4_mutual_follows",
        "SELECT e1.ego_id AS ego_id, COUNT(*) AS mutual_pairs
         FROM edge e1
         JOIN edge e2
           ON e1.ego_id = e2.ego_id
          AND e1.src_id = e2.dst_id
          AND e1.dst_id = e2.src_id
         WHERE e1.src_id < e1.dst_id
         GROUP BY e1.ego_id
         ORDER BY e1.ego_id",
    ),
];

pub fn simple_queries() -> QuerySet {
    QuerySet::new(Complexity::Simple, SIMPLE)
}

pub fn complex_queries() -> QuerySet {
    QuerySet::new(Complexity::Complex, COMPLEX)
}

/// Run one statement and render each row as a JSON object keyed by column name
pub fn query_json(conn: &Connection, sql: &str) -> SqliteResult<Vec<Value>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| SqliteError::Query(e.to_string()))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt
        .query([])
        .map_err(|e| SqliteError::Query(e.to_string()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(|e| SqliteError::Query(e.to_string()))? {
        let mut object = Map::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            let value = row
                .get_ref(idx)
                .map_err(|e| SqliteError::Query(e.to_string()))?;
            object.insert(name.clone(), to_json(value));
        }
        out.push(Value::Object(object));
    }
    Ok(out)
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
    }
}

#[async_trait]
impl QueryBackend for RelationalIngestor {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn run_query(&self, query: &str) -> StoreResult<Vec<Value>> {
        let pool = self.pool().clone();
        let sql = query.to_string();
        tokio::task::spawn_blocking(move || pool.with_connection(|conn| query_json(conn, &sql)))
            .await
            .map_err(|e| egonet_core::StoreError::Internal(e.to_string()))?
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::SqlitePool;
    use egonet_core::test_support::{
        fixture_network, mutual_follows_network, FIXTURE_AVG_FEATURES, MUTUAL_EGO_ID,
    };
    use egonet_core::{BenchmarkRunner, EgoNetworkStore};
    use std::sync::Arc;

    async fn loaded() -> RelationalIngestor {
        let store = RelationalIngestor::new(SqlitePool::memory().unwrap(), 100);
        store
            .ingest_ego_network(Arc::new(fixture_network()))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_every_query_runs() {
        let store = loaded().await;
        let runner = BenchmarkRunner::default();

        for set in [simple_queries(), complex_queries()] {
            let report = runner.run(&store, &set).await;
            assert!(report.failures.is_empty(), "{:?}", report.failures);
            assert_eq!(report.records.len(), set.len());
        }
    }

    #[tokio::test]
    async fn test_fixture_answers() {
        let store = loaded().await;

        let users = store.run_query(SIMPLE[1].1).await.unwrap();
        assert_eq!(users[0]["ego_id"], "100");
        assert_eq!(users[0]["user_count"], 3);

        let edges = store.run_query(SIMPLE[2].1).await.unwrap();
        assert_eq!(edges[0]["edge_count"], 2);

        let avg = store.run_query(SIMPLE[4].1).await.unwrap();
        assert_eq!(avg[0]["avg_features_per_node"].as_f64(), Some(FIXTURE_AVG_FEATURES));

        let overlap = store.run_query(COMPLEX[2].1).await.unwrap();
        assert_eq!(overlap.len(), 1);
        assert_eq!(overlap[0]["circle_id"], "friends");
        assert_eq!(overlap[0]["shared_features"], 1);
    }

    #[tokio::test]
    async fn test_degree_and_mutual_queries_find_rows() {
        let store = loaded().await;
        store
            .ingest_ego_network(Arc::new(mutual_follows_network()))
            .await
            .unwrap();

        let high = store.run_query(COMPLEX[1].1).await.unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0]["ego_id"], MUTUAL_EGO_ID);
        assert_eq!(high[0]["user_id"], "11");
        assert_eq!(high[0]["degree"], 3);

        let mutual = store.run_query(COMPLEX[3].1).await.unwrap();
        assert_eq!(mutual.len(), 1);
        assert_eq!(mutual[0]["ego_id"], MUTUAL_EGO_ID);
        assert_eq!(mutual[0]["mutual_pairs"], 2);
    }

    #[tokio::test]
    async fn test_bad_sql_is_a_query_error() {
        let store = loaded().await;
        let err = store.run_query("SELECT * FROM nowhere").await.unwrap_err();
        assert!(matches!(err, egonet_core::StoreError::Query(_)));
    }

    #[test]
    fn test_query_names_are_unique() {
        let mut names: Vec<_> = SIMPLE.iter().chain(COMPLEX).map(|(n, _)| *n).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), SIMPLE.len() + COMPLEX.len());
    }
}

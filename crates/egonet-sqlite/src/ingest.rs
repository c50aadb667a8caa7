//! Relational ingestion of ego networks
//!
//! Writes run in dependency order so every foreign key resolves against a row
//! committed by an earlier step. Each chunk is its own transaction and every
//! insert is `ON CONFLICT DO NOTHING`: a crash mid-import leaves a consistent
//! prefix and replaying the import is safe.

use crate::config::SqliteConfig;
use crate::connection::SqlitePool;
use crate::error::{SqliteError, SqliteResult};
use crate::schema::TABLES;
use async_trait::async_trait;
use egonet_core::{
    ChunkedBatchWriter, EgoNetwork, EgoNetworkStore, FeatureKey, IngestStats, StoreError,
    StoreResult,
};
use rusqlite::{params, Connection, OptionalExtension, Params};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

const INSERT_NODE: &str = "INSERT INTO node(node_id, node_type) VALUES (?1, ?2) ON CONFLICT DO NOTHING";
const INSERT_EGO: &str = "INSERT INTO ego(node_id) VALUES (?1) ON CONFLICT DO NOTHING";
const INSERT_USER: &str =
    "INSERT INTO user_node(node_id, ego_id) VALUES (?1, ?2) ON CONFLICT DO NOTHING";
const INSERT_CIRCLE: &str =
    "INSERT INTO circle(ego_id, circle_id) VALUES (?1, ?2) ON CONFLICT DO NOTHING";
const INSERT_GROUP: &str =
    "INSERT INTO feature_group(group_name) VALUES (?1) ON CONFLICT DO NOTHING";
const INSERT_FEATURE: &str =
    "INSERT INTO feature_name(group_id, name) VALUES (?1, ?2) ON CONFLICT DO NOTHING";
const INSERT_NODE_FEATURE: &str =
    "INSERT INTO node_feature(node_id, feature_id) VALUES (?1, ?2) ON CONFLICT DO NOTHING";
const INSERT_EDGE: &str =
    "INSERT INTO edge(src_id, dst_id, ego_id) VALUES (?1, ?2, ?3) ON CONFLICT DO NOTHING";
const INSERT_MEMBER: &str = "INSERT INTO circle_member(ego_id, circle_id, node_id) VALUES (?1, ?2, ?3) ON CONFLICT DO NOTHING";

/// SQLite implementation of [`EgoNetworkStore`]
#[derive(Clone)]
pub struct RelationalIngestor {
    pool: SqlitePool,
    writer: ChunkedBatchWriter,
}

impl RelationalIngestor {
    pub fn new(pool: SqlitePool, batch_size: usize) -> Self {
        Self {
            pool,
            writer: ChunkedBatchWriter::new(batch_size),
        }
    }

    /// Open (and migrate) the database described by `config`
    pub fn open(config: SqliteConfig, batch_size: usize) -> SqliteResult<Self> {
        Ok(Self::new(SqlitePool::new(config)?, batch_size))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn batch_size(&self) -> usize {
        self.writer.batch_size()
    }

    /// Release the connection; fails while another clone is alive
    pub fn close(self) -> SqliteResult<()> {
        self.pool.close()
    }

    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> SqliteResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || pool.with_connection_mut(f))
            .await
            .map_err(|e| StoreError::from(SqliteError::Task(e.to_string())))?
            .map_err(Into::into)
    }
}

#[async_trait]
impl EgoNetworkStore for RelationalIngestor {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn wipe(&self) -> StoreResult<()> {
        self.blocking(wipe_all).await?;
        info!("Wiped relational store");
        Ok(())
    }

    async fn ingest_ego_network(&self, network: Arc<EgoNetwork>) -> StoreResult<IngestStats> {
        let writer = self.writer;
        let ego_id = network.ego_id().to_string();

        let stats = self
            .blocking(move |conn| ingest(conn, &network, &writer))
            .await?;

        info!(
            backend = "sqlite",
            ego_id = %ego_id,
            users = stats.users,
            follows = stats.follows,
            chunks = stats.chunks,
            "Imported ego network"
        );
        Ok(stats)
    }

    async fn entity_counts(&self) -> StoreResult<BTreeMap<String, u64>> {
        self.blocking(|conn| count_tables(conn)).await
    }
}

/// Insert `rows` with `sql`, one transaction per chunk; returns chunks written
fn insert_chunked<P: Params>(
    conn: &mut Connection,
    writer: &ChunkedBatchWriter,
    step: &'static str,
    sql: &str,
    rows: Vec<P>,
) -> SqliteResult<usize> {
    let total = rows.len();
    let chunks = writer.try_for_each_chunk(rows, |chunk| {
        let tx = conn.transaction().map_err(SqliteError::write(step))?;
        {
            let mut stmt = tx.prepare_cached(sql).map_err(SqliteError::write(step))?;
            for row in chunk {
                stmt.execute(row).map_err(SqliteError::write(step))?;
            }
        }
        tx.commit().map_err(SqliteError::write(step))
    })?;

    debug!(step, rows = total, chunks, "Wrote relational step");
    Ok(chunks)
}

fn ingest(
    conn: &mut Connection,
    network: &EgoNetwork,
    writer: &ChunkedBatchWriter,
) -> SqliteResult<IngestStats> {
    let ego_id = network.ego_id();
    let mut stats = IngestStats::default();

    // 1. ego
    stats.chunks += insert_chunked(conn, writer, "ego node", INSERT_NODE, vec![(ego_id, "ego")])?;
    stats.chunks += insert_chunked(conn, writer, "ego", INSERT_EGO, vec![(ego_id,)])?;

    // 2. users
    let users: Vec<&str> = network.users().collect();
    stats.users = users.len();
    stats.chunks += insert_chunked(
        conn,
        writer,
        "user nodes",
        INSERT_NODE,
        users.iter().map(|u| (*u, "user")).collect(),
    )?;
    stats.chunks += insert_chunked(
        conn,
        writer,
        "users",
        INSERT_USER,
        users.iter().map(|u| (*u, ego_id)).collect(),
    )?;

    // 3. circles
    let circles: Vec<(&str, &str)> = network
        .circles()
        .iter()
        .map(|c| (ego_id, c.name.as_str()))
        .collect();
    stats.circles = circles.len();
    stats.chunks += insert_chunked(conn, writer, "circles", INSERT_CIRCLE, circles)?;

    // 4. feature groups, then read back their surrogate ids
    let groups = network.feature_groups();
    stats.feature_groups = groups.len();
    stats.chunks += insert_chunked(
        conn,
        writer,
        "feature groups",
        INSERT_GROUP,
        groups.iter().map(|g| (*g,)).collect(),
    )?;
    let group_ids = resolve_group_ids(conn, &groups)?;

    // 5. feature names keyed by group id, then read back feature ids
    let features = network.features();
    stats.features = features.len();
    let feature_rows = features
        .iter()
        .map(|key| Ok((group_id(&group_ids, key)?, key.name.as_str())))
        .collect::<SqliteResult<Vec<_>>>()?;
    stats.chunks += insert_chunked(conn, writer, "feature names", INSERT_FEATURE, feature_rows)?;
    let feature_ids = resolve_feature_ids(conn, &group_ids, &features)?;

    // 6. node features, ego included
    let assignments = network
        .feature_assignments()
        .map(|(node, _, key)| {
            feature_ids
                .get(key)
                .map(|id| (node, *id))
                .ok_or_else(|| SqliteError::UnresolvedFeature {
                    group: key.group.clone(),
                    name: key.name.clone(),
                })
        })
        .collect::<SqliteResult<Vec<_>>>()?;
    stats.feature_assignments = assignments.len();
    stats.chunks += insert_chunked(
        conn,
        writer,
        "node features",
        INSERT_NODE_FEATURE,
        assignments,
    )?;

    // 7. edges
    let edges: Vec<(&str, &str, &str)> = network
        .edges()
        .iter()
        .map(|e| (e.src.as_str(), e.dst.as_str(), ego_id))
        .collect();
    stats.follows = edges.len();
    stats.chunks += insert_chunked(conn, writer, "edges", INSERT_EDGE, edges)?;

    // 8. circle memberships
    let members: Vec<(&str, &str, &str)> = network
        .memberships()
        .map(|(circle, member)| (ego_id, circle, member))
        .collect();
    stats.memberships = members.len();
    stats.chunks += insert_chunked(conn, writer, "circle members", INSERT_MEMBER, members)?;

    Ok(stats)
}

fn group_id(group_ids: &HashMap<String, i64>, key: &FeatureKey) -> SqliteResult<i64> {
    group_ids
        .get(&key.group)
        .copied()
        .ok_or_else(|| SqliteError::UnresolvedFeature {
            group: key.group.clone(),
            name: key.name.clone(),
        })
}

/// Group name -> surrogate id for the groups of one network
fn resolve_group_ids(conn: &Connection, groups: &[&str]) -> SqliteResult<HashMap<String, i64>> {
    let mut stmt = conn.prepare_cached("SELECT group_id FROM feature_group WHERE group_name = ?1")?;
    let mut ids = HashMap::with_capacity(groups.len());
    for group in groups {
        if let Some(id) = stmt
            .query_row([group], |row| row.get::<_, i64>(0))
            .optional()?
        {
            ids.insert(group.to_string(), id);
        }
    }
    Ok(ids)
}

/// (group, name) -> surrogate feature id for the features of one network
fn resolve_feature_ids<'a>(
    conn: &Connection,
    group_ids: &HashMap<String, i64>,
    features: &[&'a FeatureKey],
) -> SqliteResult<HashMap<&'a FeatureKey, i64>> {
    let mut stmt = conn
        .prepare_cached("SELECT feature_id FROM feature_name WHERE group_id = ?1 AND name = ?2")?;
    let mut ids = HashMap::with_capacity(features.len());
    for key in features {
        let group = group_id(group_ids, key)?;
        if let Some(id) = stmt
            .query_row(params![group, key.name], |row| row.get::<_, i64>(0))
            .optional()?
        {
            ids.insert(*key, id);
        }
    }
    Ok(ids)
}

/// Delete every row child-first in one transaction and reset surrogate ids
fn wipe_all(conn: &mut Connection) -> SqliteResult<()> {
    let tx = conn.transaction()?;
    for table in TABLES {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
    }
    tx.execute(
        "DELETE FROM sqlite_sequence WHERE name IN ('feature_group', 'feature_name')",
        [],
    )?;
    tx.commit()?;
    Ok(())
}

fn count_tables(conn: &Connection) -> SqliteResult<BTreeMap<String, u64>> {
    let mut counts = BTreeMap::new();
    for table in TABLES {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        counts.insert(table.to_string(), count as u64);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egonet_core::test_support::{colliding_names_network, fixture_network};
    use egonet_core::{Edge, EgoNetwork, FeatureKey, FeatureVocabulary, QueryBackend};

    fn ingestor(batch_size: usize) -> RelationalIngestor {
        RelationalIngestor::new(SqlitePool::memory().unwrap(), batch_size)
    }

    #[tokio::test]
    async fn test_fixture_counts() {
        let store = ingestor(50_000);
        let stats = store
            .ingest_ego_network(Arc::new(fixture_network()))
            .await
            .unwrap();

        assert_eq!(stats.users, 3);
        assert_eq!(stats.feature_assignments, 5);
        assert_eq!(stats.memberships, 2);

        let counts = store.entity_counts().await.unwrap();
        assert_eq!(counts["node"], 4);
        assert_eq!(counts["ego"], 1);
        assert_eq!(counts["user_node"], 3);
        assert_eq!(counts["circle"], 1);
        assert_eq!(counts["circle_member"], 2);
        assert_eq!(counts["feature_group"], 2);
        assert_eq!(counts["feature_name"], 2);
        assert_eq!(counts["node_feature"], 5);
        assert_eq!(counts["edge"], 2);
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let store = ingestor(1);
        let network = Arc::new(fixture_network());

        store.ingest_ego_network(network.clone()).await.unwrap();
        let first = store.entity_counts().await.unwrap();
        store.ingest_ego_network(network).await.unwrap();

        assert_eq!(store.entity_counts().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_colliding_feature_names_resolve_by_group() {
        let store = ingestor(100);
        store
            .ingest_ego_network(Arc::new(colliding_names_network()))
            .await
            .unwrap();

        let rows: Vec<(String, String)> = store
            .pool()
            .with_connection(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT nf.node_id, fg.group_name
                     FROM node_feature nf
                     JOIN feature_name fn ON fn.feature_id = nf.feature_id
                     JOIN feature_group fg ON fg.group_id = fn.group_id
                     ORDER BY nf.node_id",
                )?;
                let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
                Ok(rows.collect::<Result<_, _>>()?)
            })
            .unwrap();

        assert_eq!(
            rows,
            vec![
                ("a".to_string(), "first_name".to_string()),
                ("b".to_string(), "last_name".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_wipe_clears_rows_and_resets_ids() {
        let store = ingestor(10);
        store
            .ingest_ego_network(Arc::new(fixture_network()))
            .await
            .unwrap();
        store.wipe().await.unwrap();

        let counts = store.entity_counts().await.unwrap();
        assert!(counts.values().all(|c| *c == 0));

        store
            .ingest_ego_network(Arc::new(fixture_network()))
            .await
            .unwrap();
        let min_group: i64 = store
            .pool()
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT MIN(group_id) FROM feature_group", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(min_group, 1);
    }

    #[tokio::test]
    async fn test_dangling_edge_is_rejected_by_foreign_keys() {
        let store = ingestor(10);
        store
            .ingest_ego_network(Arc::new(fixture_network()))
            .await
            .unwrap();

        let err = store
            .pool()
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO edge(src_id, dst_id, ego_id) VALUES ('1', 'ghost', '100')",
                    [],
                )?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, SqliteError::Rusqlite(_)));
    }

    #[tokio::test]
    async fn test_shared_users_belong_to_every_ego() {
        let store = ingestor(10);
        let shared = |ego: &str| {
            EgoNetwork::builder(ego)
                .vocabulary(FeatureVocabulary::from_iter([(0, FeatureKey::new("g", "x"))]))
                .user("u1", vec![FeatureKey::new("g", "x")])
                .user("u2", vec![])
                .edges(vec![Edge::new("u1", "u2")])
                .build()
        };

        store.ingest_ego_network(Arc::new(shared("e1"))).await.unwrap();
        store.ingest_ego_network(Arc::new(shared("e2"))).await.unwrap();

        let counts = store.entity_counts().await.unwrap();
        assert_eq!(counts["ego"], 2);
        assert_eq!(counts["node"], 4);
        assert_eq!(counts["user_node"], 4);
        // the same follow is recorded once per ego network
        assert_eq!(counts["edge"], 2);
        assert_eq!(counts["feature_name"], 1);
        assert_eq!(counts["node_feature"], 1);

        let per_ego = store
            .run_query(crate::queries::SIMPLE[1].1)
            .await
            .unwrap();
        assert_eq!(per_ego.len(), 2);
        assert!(per_ego.iter().all(|row| row["user_count"] == 2));
    }
}

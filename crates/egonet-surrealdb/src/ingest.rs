//! Graph ingestion of ego networks
//!
//! Every record id is derived from its natural key and every write is
//! existence-checked, so replaying an import changes nothing. Steps run in
//! dependency order: a relation is only created once both endpoints were
//! written by an earlier step.

use crate::schema::{apply_graph_schema, EDGE_TABLES, NODE_TABLES};
use crate::surreal_client::SurrealClient;
use crate::types::{DbError, DbResult, SurrealDbConfig};
use async_trait::async_trait;
use egonet_core::{
    ChunkedBatchWriter, EgoNetwork, EgoNetworkStore, FeatureKey, IngestStats, StoreResult,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

const WIPE_BATCH: &str = "LET $batch = (SELECT VALUE id FROM type::table($table) LIMIT $limit);
FOR $id IN $batch { DELETE $id RETURN NONE; };";

const COUNT_TABLE: &str = "SELECT count() AS count FROM type::table($table) GROUP ALL";

/// Create-if-absent for rows `{ key, label, ... }` of one node table
fn upsert_nodes_sql(table: &str) -> String {
    format!(
        "FOR $row IN $rows {{
    IF array::len((SELECT id FROM {table} WHERE key = $row.key LIMIT 1)) == 0 {{
        CREATE type::thing('{table}', $row.key) CONTENT $row RETURN NONE;
    }};
}};"
    )
}

/// Relate-if-absent for rows `{ in_tb, in_key, out_tb, out_key, props }`
fn relate_sql(edge: &str) -> String {
    format!(
        "FOR $row IN $rows {{
    LET $from = type::thing($row.in_tb, $row.in_key);
    LET $to = type::thing($row.out_tb, $row.out_key);
    LET $props = $row.props;
    IF array::len((SELECT id FROM {edge} WHERE in = $from AND out = $to LIMIT 1)) == 0 {{
        RELATE $from->{edge}->$to CONTENT $props RETURN NONE;
    }};
}};"
    )
}

/// Follows are unique per owning ego, so the same pair may appear once per network
const RELATE_FOLLOWS: &str = "FOR $row IN $rows {
    LET $from = type::thing($row.in_tb, $row.in_key);
    LET $to = type::thing($row.out_tb, $row.out_key);
    IF array::len((SELECT id FROM follows WHERE in = $from AND out = $to AND ego = $row.ego LIMIT 1)) == 0 {
        RELATE $from->follows->$to SET kind = $row.kind, ego = $row.ego RETURN NONE;
    };
};";

/// Record key of a circle: circles are only unique within their ego
pub fn circle_key(ego_id: &str, name: &str) -> String {
    json!([ego_id, name]).to_string()
}

/// Record key of a feature name: names are only unique within their group
pub fn feature_key(key: &FeatureKey) -> String {
    json!([key.group, key.name]).to_string()
}

fn rows_param(rows: Vec<Value>) -> Value {
    let mut map = Map::new();
    map.insert("rows".to_string(), Value::Array(rows));
    Value::Object(map)
}

fn relation(in_tb: &str, in_key: &str, out_tb: &str, out_key: &str) -> Value {
    json!({
        "in_tb": in_tb,
        "in_key": in_key,
        "out_tb": out_tb,
        "out_key": out_key,
        "props": {},
    })
}

/// SurrealDB implementation of [`EgoNetworkStore`]
#[derive(Clone, Debug)]
pub struct GraphIngestor {
    client: SurrealClient,
    writer: ChunkedBatchWriter,
    wipe_batch_size: usize,
}

impl GraphIngestor {
    pub fn new(client: SurrealClient, batch_size: usize) -> Self {
        let wipe_batch_size = client.config().wipe_batch_size.max(1);
        Self {
            client,
            writer: ChunkedBatchWriter::new(batch_size),
            wipe_batch_size,
        }
    }

    /// Open the datastore described by `config` and apply the graph schema
    pub async fn open(config: SurrealDbConfig, batch_size: usize) -> DbResult<Self> {
        let client = SurrealClient::new(config).await?;
        apply_graph_schema(&client).await?;
        Ok(Self::new(client, batch_size))
    }

    pub fn client(&self) -> &SurrealClient {
        &self.client
    }

    pub fn batch_size(&self) -> usize {
        self.writer.batch_size()
    }

    /// Release the datastore; fails while another clone is alive
    pub fn close(self) -> DbResult<()> {
        self.client.close()
    }

    /// Run `statement` over `rows` chunk by chunk; returns chunks written
    async fn write_rows(
        &self,
        step: &'static str,
        statement: &str,
        rows: Vec<Value>,
    ) -> DbResult<usize> {
        let total = rows.len();
        let client = &self.client;
        let chunks = self
            .writer
            .write_all(rows, |chunk| async move {
                client
                    .execute(statement, &[rows_param(chunk)])
                    .await
                    .map_err(|e| e.during(step))
            })
            .await?;

        debug!(step, rows = total, chunks, "Wrote graph step");
        Ok(chunks)
    }

    async fn ingest(&self, network: &EgoNetwork) -> DbResult<IngestStats> {
        let ego_id = network.ego_id();
        let mut stats = IngestStats::default();

        // 1. constraints
        apply_graph_schema(&self.client).await?;

        // 2. ego
        stats.chunks += self
            .write_rows(
                "ego",
                &upsert_nodes_sql("ego"),
                vec![json!({ "key": ego_id, "label": "ego" })],
            )
            .await?;

        // 3. users
        let users: Vec<Value> = network
            .users()
            .map(|id| json!({ "key": id, "label": "user" }))
            .collect();
        stats.users = users.len();
        stats.chunks += self
            .write_rows("users", &upsert_nodes_sql("user"), users)
            .await?;

        // 4. circles and ego -> circle
        let circles: Vec<Value> = network
            .circles()
            .iter()
            .map(|c| {
                json!({
                    "key": circle_key(ego_id, &c.name),
                    "label": "circle",
                    "ego": ego_id,
                    "name": c.name,
                })
            })
            .collect();
        stats.circles = circles.len();
        stats.chunks += self
            .write_rows("circles", &upsert_nodes_sql("circle"), circles)
            .await?;
        let owns: Vec<Value> = network
            .circles()
            .iter()
            .map(|c| relation("ego", ego_id, "circle", &circle_key(ego_id, &c.name)))
            .collect();
        stats.chunks += self.write_rows("owns", &relate_sql("owns"), owns).await?;

        // 5. feature groups, feature names and group -> name
        let groups: Vec<Value> = network
            .feature_groups()
            .into_iter()
            .map(|g| json!({ "key": g, "label": "feat_group", "name": g }))
            .collect();
        stats.feature_groups = groups.len();
        stats.chunks += self
            .write_rows("feature groups", &upsert_nodes_sql("feat_group"), groups)
            .await?;

        let features = network.features();
        stats.features = features.len();
        let names: Vec<Value> = features
            .iter()
            .map(|key| {
                json!({
                    "key": feature_key(key),
                    "label": "feat_name",
                    "group_name": key.group,
                    "name": key.name,
                })
            })
            .collect();
        stats.chunks += self
            .write_rows("feature names", &upsert_nodes_sql("feat_name"), names)
            .await?;
        let owns_feat: Vec<Value> = features
            .iter()
            .map(|key| relation("feat_group", &key.group, "feat_name", &feature_key(key)))
            .collect();
        stats.chunks += self
            .write_rows("owns_feat", &relate_sql("owns_feat"), owns_feat)
            .await?;

        // 6. node -> feature, ego included
        let has_feat: Vec<Value> = network
            .feature_assignments()
            .map(|(node, kind, key)| relation(kind.as_str(), node, "feat_name", &feature_key(key)))
            .collect();
        stats.feature_assignments = has_feat.len();
        stats.chunks += self
            .write_rows("has_feat", &relate_sql("has_feat"), has_feat)
            .await?;

        // 7. follows: ego -> every user, then the user edge list
        let ego_follows = network.users().map(|user| {
            json!({
                "in_tb": "ego", "in_key": ego_id,
                "out_tb": "user", "out_key": user,
                "kind": "ego", "ego": ego_id,
            })
        });
        let user_follows = network.edges().iter().map(|e| {
            json!({
                "in_tb": "user", "in_key": e.src,
                "out_tb": "user", "out_key": e.dst,
                "kind": "user", "ego": ego_id,
            })
        });
        let follows: Vec<Value> = ego_follows.chain(user_follows).collect();
        stats.follows = network.edges().len();
        stats.chunks += self
            .write_rows("follows", RELATE_FOLLOWS, follows)
            .await?;

        // 8. user -> circle
        let part_of: Vec<Value> = network
            .memberships()
            .map(|(circle, member)| relation("user", member, "circle", &circle_key(ego_id, circle)))
            .collect();
        stats.memberships = part_of.len();
        stats.chunks += self
            .write_rows("part_of", &relate_sql("part_of"), part_of)
            .await?;

        Ok(stats)
    }

    async fn count(&self, table: &str) -> DbResult<u64> {
        let rows = self
            .client
            .query(COUNT_TABLE, &[json!({ "table": table })])
            .await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    /// Delete every record, relations first, in bounded batches
    async fn wipe_all(&self) -> DbResult<()> {
        for table in EDGE_TABLES.iter().chain(NODE_TABLES) {
            let mut remaining = self.count(table).await?;
            while remaining > 0 {
                self.client
                    .execute(
                        WIPE_BATCH,
                        &[json!({ "table": table, "limit": self.wipe_batch_size })],
                    )
                    .await
                    .map_err(|e| e.during("wipe"))?;

                let after = self.count(table).await?;
                if after >= remaining {
                    return Err(DbError::Write {
                        step: "wipe",
                        message: format!("{table} still holds {after} records after a delete batch"),
                    });
                }
                debug!(table, deleted = remaining - after, remaining = after, "Wipe batch");
                remaining = after;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EgoNetworkStore for GraphIngestor {
    fn backend_name(&self) -> &'static str {
        "surrealdb"
    }

    async fn wipe(&self) -> StoreResult<()> {
        self.wipe_all().await?;
        info!("Wiped graph store");
        Ok(())
    }

    async fn ingest_ego_network(&self, network: Arc<EgoNetwork>) -> StoreResult<IngestStats> {
        let stats = self.ingest(&network).await?;

        info!(
            backend = "surrealdb",
            ego_id = %network.ego_id(),
            users = stats.users,
            follows = stats.follows,
            chunks = stats.chunks,
            "Imported ego network"
        );
        Ok(stats)
    }

    async fn entity_counts(&self) -> StoreResult<BTreeMap<String, u64>> {
        let mut counts = BTreeMap::new();
        for table in NODE_TABLES.iter().chain(EDGE_TABLES) {
            counts.insert(table.to_string(), self.count(table).await?);
        }
        Ok(counts)
    }
}

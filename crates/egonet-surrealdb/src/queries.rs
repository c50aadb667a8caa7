//! Benchmark query set for the graph store
//!
//! Names and output aliases mirror the relational set. Users are counted
//! through the ego's `follows` edges and edges through `kind = 'user'`
//! follows, each scoped by the `ego` field carried on the relation.

use crate::ingest::GraphIngestor;
use async_trait::async_trait;
use egonet_core::{Complexity, QueryBackend, QuerySet, StoreResult};
use serde_json::Value;

pub const SIMPLE: &[(&str, &str)] = &[
    (
        "S1_nodes_by_label",
        "SELECT label, count() AS count
         FROM ego, user, circle, feat_group, feat_name
         GROUP BY label
         ORDER BY label",
    ),
    (
        "S2_users_per_ego",
        "SELECT key AS ego_id, array::len(->(follows WHERE kind = 'ego')) AS user_count
         FROM ego
         ORDER BY ego_id",
    ),
    (
        "S3_edges_per_ego",
        "SELECT ego AS ego_id, count() AS edge_count
         FROM follows
         WHERE kind = 'user'
         GROUP BY ego_id
         ORDER BY ego_id",
    ),
    (
        "S4_circles_per_ego",
        "SELECT key AS ego_id, array::len(->owns) AS circle_count
         FROM ego
         WHERE array::len(->owns) > 0
         ORDER BY ego_id",
    ),
    (
        "S5_avg_features_per_node",
        "SELECT math::mean(feature_count) AS avg_features_per_node
         FROM (SELECT array::len(->has_feat) AS feature_count FROM user, ego)
         WHERE feature_count > 0
         GROUP ALL",
    ),
    (
        "S6_top_features",
        "SELECT group_name AS feature_group, name AS feature_name,
                array::len(<-has_feat) AS usage_count
         FROM feat_name
         WHERE array::len(<-has_feat) > 0
         ORDER BY usage_count DESC, feature_group ASC, feature_name ASC
         LIMIT 10",
    ),
];

pub const COMPLEX: &[(&str, &str)] = &[
    (
        "C1_avg_circle_size",
        "SELECT ego_id, math::mean(member_count) AS avg_circle_size
         FROM (SELECT ego AS ego_id, array::len(<-part_of) AS member_count FROM circle)
         WHERE member_count > 0
         GROUP BY ego_id
         ORDER BY ego_id",
    ),
    (
        "C2_high_degree_users",
        "LET $degrees = (
             SELECT ego AS ego_id, in.key AS user_id, count() AS degree
             FROM follows
             WHERE kind = 'user'
             GROUP BY ego_id, user_id
         );
         SELECT ego_id, user_id, degree
         FROM $degrees
         WHERE degree > math::mean((SELECT VALUE degree FROM $degrees WHERE ego_id = $parent.ego_id))
         ORDER BY ego_id ASC, degree DESC, user_id ASC",
    ),
    (
        "C3_feature_overlap",
        "SELECT ego_id, circle_id, count() AS shared_features
         FROM (
             SELECT ego_id, circle_id, feature, count() AS holders
             FROM (
                 SELECT out.ego AS ego_id, out.name AS circle_id,
                        in->has_feat->feat_name AS feature
                 FROM part_of
                 WHERE array::len(in->has_feat) > 0
                 SPLIT feature
             )
             GROUP BY ego_id, circle_id, feature
         )
         WHERE holders >= 2
         GROUP BY ego_id, circle_id
         ORDER BY ego_id, circle_id",
    ),
    (
        "C4_mutual_follows",
        "SELECT ego AS ego_id, count() AS mutual_pairs
         FROM follows
         WHERE kind = 'user'
           AND in.key < out.key
           AND array::len((
               SELECT id FROM follows
               WHERE kind = 'user' AND ego = $parent.ego AND in = $parent.out AND out = $parent.in
               LIMIT 1
           )) > 0
         GROUP BY ego_id
         ORDER BY ego_id",
    ),
];

pub fn simple_queries() -> QuerySet {
    QuerySet::new(Complexity::Simple, SIMPLE)
}

pub fn complex_queries() -> QuerySet {
    QuerySet::new(Complexity::Complex, COMPLEX)
}

#[async_trait]
impl QueryBackend for GraphIngestor {
    fn backend_name(&self) -> &'static str {
        "surrealdb"
    }

    async fn run_query(&self, query: &str) -> StoreResult<Vec<Value>> {
        Ok(self.client().query(query, &[]).await?)
    }
}

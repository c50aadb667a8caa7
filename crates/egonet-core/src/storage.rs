//! Store seams implemented by every backend

use crate::error::StoreResult;
use crate::model::EgoNetwork;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::AddAssign;
use std::sync::Arc;

/// Records submitted by one ego-network import, per step
///
/// These are submission counts: on a re-import the same numbers are reported
/// even though the store absorbs every record as already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub users: usize,
    pub circles: usize,
    pub feature_groups: usize,
    pub features: usize,
    pub feature_assignments: usize,
    pub follows: usize,
    pub memberships: usize,
    /// Write operations issued across all steps
    pub chunks: usize,
}

impl AddAssign for IngestStats {
    fn add_assign(&mut self, rhs: Self) {
        self.users += rhs.users;
        self.circles += rhs.circles;
        self.feature_groups += rhs.feature_groups;
        self.features += rhs.features;
        self.feature_assignments += rhs.feature_assignments;
        self.follows += rhs.follows;
        self.memberships += rhs.memberships;
        self.chunks += rhs.chunks;
    }
}

/// A persistent store that can hold ego networks
#[async_trait]
pub trait EgoNetworkStore: Send + Sync {
    /// Short backend identifier used in logs and reports
    fn backend_name(&self) -> &'static str;

    /// Remove every persisted record; the schema stays in place
    async fn wipe(&self) -> StoreResult<()>;

    /// Write one ego network in dependency order
    ///
    /// Idempotent: importing the same network again changes nothing.
    async fn ingest_ego_network(&self, network: Arc<EgoNetwork>) -> StoreResult<IngestStats>;

    /// Persisted record count per table
    async fn entity_counts(&self) -> StoreResult<BTreeMap<String, u64>>;
}

/// A store that answers benchmark queries
#[async_trait]
pub trait QueryBackend: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Execute a query, returning each row as a JSON object
    async fn run_query(&self, query: &str) -> StoreResult<Vec<serde_json::Value>>;
}

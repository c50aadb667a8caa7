//! The store handles held for one run

use crate::cli::Backend;
use crate::config::{sqlite_config, surreal_config};
use anyhow::{Context, Result};
use egonet_config::EgonetConfig;
use egonet_core::{EgoNetwork, EgoNetworkStore, IngestStats, QueryBackend, StoreResult};
use egonet_sqlite::RelationalIngestor;
use egonet_surrealdb::GraphIngestor;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// One handle per selected backend
pub struct Stores {
    pub graph: Option<GraphIngestor>,
    pub relational: Option<RelationalIngestor>,
}

/// Per-backend totals of one import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportTotals {
    pub graph: Option<IngestStats>,
    pub relational: Option<IngestStats>,
}

impl ImportTotals {
    fn add(&mut self, graph: Option<IngestStats>, relational: Option<IngestStats>) {
        if let Some(stats) = graph {
            *self.graph.get_or_insert_with(IngestStats::default) += stats;
        }
        if let Some(stats) = relational {
            *self.relational.get_or_insert_with(IngestStats::default) += stats;
        }
    }
}

impl Stores {
    /// Open the selected stores; a store that cannot be opened ends the run
    pub async fn open(config: &EgonetConfig, backend: Backend) -> Result<Self> {
        let batch_size = config.ingest.batch_size;

        let graph = if backend.graph() {
            if config.graph.path.is_none() {
                warn!("Graph store is in memory; its contents last only for this process");
            }
            Some(
                GraphIngestor::open(surreal_config(config), batch_size)
                    .await
                    .context("Failed to open graph store")?,
            )
        } else {
            None
        };

        let relational = if backend.relational() {
            Some(
                RelationalIngestor::open(sqlite_config(config), batch_size).with_context(|| {
                    format!(
                        "Failed to open relational store at {}",
                        config.relational.path.display()
                    )
                })?,
            )
        } else {
            None
        };

        Ok(Self { graph, relational })
    }

    pub async fn wipe(&self) -> Result<()> {
        if let Some(graph) = &self.graph {
            graph.wipe().await.context("Failed to wipe graph store")?;
        }
        if let Some(relational) = &self.relational {
            relational
                .wipe()
                .await
                .context("Failed to wipe relational store")?;
        }
        Ok(())
    }

    /// Write one ego network to every selected store concurrently
    pub async fn ingest(
        &self,
        network: Arc<EgoNetwork>,
    ) -> StoreResult<(Option<IngestStats>, Option<IngestStats>)> {
        let graph = async {
            match &self.graph {
                Some(store) => store.ingest_ego_network(network.clone()).await.map(Some),
                None => Ok(None),
            }
        };
        let relational = async {
            match &self.relational {
                Some(store) => store.ingest_ego_network(network.clone()).await.map(Some),
                None => Ok(None),
            }
        };
        tokio::try_join!(graph, relational)
    }

    /// Accumulate one network's results into `totals`
    pub async fn ingest_into(&self, network: Arc<EgoNetwork>, totals: &mut ImportTotals) -> StoreResult<()> {
        let (graph, relational) = self.ingest(network).await?;
        totals.add(graph, relational);
        Ok(())
    }

    /// Query backends in a stable order: graph first
    pub fn query_backends(&self) -> Vec<&dyn QueryBackend> {
        let mut backends: Vec<&dyn QueryBackend> = Vec::new();
        if let Some(graph) = &self.graph {
            backends.push(graph);
        }
        if let Some(relational) = &self.relational {
            backends.push(relational);
        }
        backends
    }

    /// Record counts per table, keyed by backend name
    pub async fn entity_counts(&self) -> Result<BTreeMap<&'static str, BTreeMap<String, u64>>> {
        let mut counts = BTreeMap::new();
        if let Some(graph) = &self.graph {
            counts.insert(
                EgoNetworkStore::backend_name(graph),
                graph.entity_counts().await.context("Failed to count graph records")?,
            );
        }
        if let Some(relational) = &self.relational {
            counts.insert(
                EgoNetworkStore::backend_name(relational),
                relational
                    .entity_counts()
                    .await
                    .context("Failed to count relational rows")?,
            );
        }
        Ok(counts)
    }

    /// Release every handle
    pub fn close(self) -> Result<()> {
        if let Some(graph) = self.graph {
            graph.close().context("Failed to close graph store")?;
        }
        if let Some(relational) = self.relational {
            relational
                .close()
                .context("Failed to close relational store")?;
        }
        info!("Closed stores");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egonet_core::test_support::fixture_network;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> EgonetConfig {
        let mut config = EgonetConfig::default();
        config.relational.path = dir.path().join("egonet.db");
        config
    }

    #[tokio::test]
    async fn test_both_backends_ingest_the_same_network() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::open(&config_in(&dir), Backend::Both).await.unwrap();

        let mut totals = ImportTotals::default();
        stores
            .ingest_into(Arc::new(fixture_network()), &mut totals)
            .await
            .unwrap();

        let graph = totals.graph.unwrap();
        let relational = totals.relational.unwrap();
        assert_eq!(graph.users, relational.users);
        assert_eq!(graph.follows, relational.follows);
        assert_eq!(stores.query_backends().len(), 2);

        let counts = stores.entity_counts().await.unwrap();
        assert_eq!(counts["surrealdb"]["user"], 3);
        assert_eq!(counts["sqlite"]["user_node"], 3);
        stores.close().unwrap();
    }

    #[tokio::test]
    async fn test_only_selected_backend_is_opened() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::open(&config_in(&dir), Backend::Relational)
            .await
            .unwrap();

        assert!(stores.graph.is_none());
        let (graph, relational) = stores.ingest(Arc::new(fixture_network())).await.unwrap();
        assert!(graph.is_none());
        assert_eq!(relational.unwrap().users, 3);
    }
}

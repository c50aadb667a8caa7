//! Effective configuration: defaults < config file < environment < flags

use crate::cli::Cli;
use anyhow::{Context, Result};
use egonet_config::EgonetConfig;
use egonet_sqlite::SqliteConfig;
use egonet_surrealdb::SurrealDbConfig;
use std::path::PathBuf;

/// Command-line values that override the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_dir: Option<PathBuf>,
    pub sqlite_path: Option<PathBuf>,
    pub graph_path: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub wipe: bool,
    pub output: Option<PathBuf>,
}

impl CliOverrides {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            data_dir: cli.data_dir.clone(),
            sqlite_path: cli.sqlite_path.clone(),
            graph_path: cli.graph_path.clone(),
            ..Self::default()
        }
    }

    pub fn apply(&self, config: &mut EgonetConfig) {
        if let Some(dir) = &self.data_dir {
            config.dataset.dir = dir.clone();
        }
        if let Some(path) = &self.sqlite_path {
            config.relational.path = path.clone();
        }
        if let Some(path) = &self.graph_path {
            config.graph.path = Some(path.clone());
        }
        if let Some(size) = self.batch_size {
            config.ingest.batch_size = size;
        }
        if self.wipe {
            config.ingest.wipe_before_import = true;
        }
        if let Some(output) = &self.output {
            config.benchmark.output = Some(output.clone());
        }
    }
}

/// Load the layered configuration and apply command-line overrides on top
pub fn load(cli: &Cli, overrides: &CliOverrides) -> Result<EgonetConfig> {
    let mut config = EgonetConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    overrides.apply(&mut config);
    config
        .validate()
        .context("Invalid configuration after command-line overrides")?;
    Ok(config)
}

pub fn sqlite_config(config: &EgonetConfig) -> SqliteConfig {
    let relational = &config.relational;
    SqliteConfig {
        path: relational.path.clone(),
        wal_mode: relational.wal_mode,
        busy_timeout_ms: relational.busy_timeout_ms,
        cache_size: relational.cache_size,
        ..SqliteConfig::default()
    }
}

pub fn surreal_config(config: &EgonetConfig) -> SurrealDbConfig {
    let graph = &config.graph;
    SurrealDbConfig {
        namespace: graph.namespace.clone(),
        database: graph.database.clone(),
        path: graph.path.clone(),
        wipe_batch_size: graph.wipe_batch_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_loaded_values() {
        let mut config = EgonetConfig::default();
        let overrides = CliOverrides {
            data_dir: Some("/data/gplus".into()),
            batch_size: Some(7),
            wipe: true,
            ..CliOverrides::default()
        };

        overrides.apply(&mut config);

        assert_eq!(config.dataset.dir, PathBuf::from("/data/gplus"));
        assert_eq!(config.ingest.batch_size, 7);
        assert!(config.ingest.wipe_before_import);
        assert_eq!(config.relational.path, EgonetConfig::default().relational.path);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = EgonetConfig::default();
        config.ingest.wipe_before_import = true;
        CliOverrides::default().apply(&mut config);
        assert!(config.ingest.wipe_before_import);
    }

    #[test]
    fn test_backend_configs_follow_sections() {
        let mut config = EgonetConfig::default();
        config.relational.wal_mode = false;
        config.graph.wipe_batch_size = 42;

        assert!(!sqlite_config(&config).wal_mode);
        assert!(sqlite_config(&config).foreign_keys);
        assert_eq!(surreal_config(&config).wipe_batch_size, 42);
        assert_eq!(surreal_config(&config).path, None);
    }
}

//! Layered loading: defaults < file < environment
//!
//! Command-line flags are the last layer and are applied by the binary.

use crate::components::{
    BenchmarkConfig, DatasetConfig, GraphConfig, IngestConfig, LoggingConfig, RelationalConfig,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "EGONET_";

/// When set, the user config file is never read
pub const TEST_MODE_VAR: &str = "EGONET_TEST_MODE";

/// Complete egonet configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EgonetConfig {
    pub dataset: DatasetConfig,
    pub ingest: IngestConfig,
    pub graph: GraphConfig,
    pub relational: RelationalConfig,
    pub benchmark: BenchmarkConfig,
    pub logging: LoggingConfig,
}

impl EgonetConfig {
    /// Load with precedence defaults < file < environment, then validate
    ///
    /// An explicit `config_file` must exist. Without one, the default path is
    /// read when present.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file_or_default(config_file)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// `~/.config/egonet/config.toml` (platform config dir)
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("egonet").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    fn from_file_or_default(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_file {
            return Self::from_file(path);
        }

        if std::env::var_os(TEST_MODE_VAR).is_some() {
            return Ok(Self::default());
        }

        match Self::default_config_path() {
            Ok(path) if path.exists() => {
                debug!(path = %path.display(), "Loading config file");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply `EGONET_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(dir) = var("DATA_DIR") {
            self.dataset.dir = PathBuf::from(dir);
        }
        if let Some(size) = var("BATCH_SIZE") {
            self.ingest.batch_size = parse_env("BATCH_SIZE", &size)?;
        }
        if let Some(wipe) = var("WIPE_BEFORE_IMPORT") {
            self.ingest.wipe_before_import = parse_env("WIPE_BEFORE_IMPORT", &wipe)?;
        }
        if let Some(path) = var("GRAPH_PATH") {
            self.graph.path = Some(PathBuf::from(path));
        }
        if let Some(ns) = var("GRAPH_NAMESPACE") {
            self.graph.namespace = ns;
        }
        if let Some(db) = var("GRAPH_DATABASE") {
            self.graph.database = db;
        }
        if let Some(path) = var("SQLITE_PATH") {
            self.relational.path = PathBuf::from(path);
        }
        if let Some(rows) = var("PREVIEW_ROWS") {
            self.benchmark.preview_rows = parse_env("PREVIEW_ROWS", &rows)?;
        }
        if let Some(output) = var("OUTPUT") {
            self.benchmark.output = Some(PathBuf::from(output));
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Reject values no run could use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.batch_size == 0 {
            return Err(ConfigError::invalid(
                "ingest.batch_size",
                "must be at least 1",
            ));
        }
        if self.graph.wipe_batch_size == 0 {
            return Err(ConfigError::invalid(
                "graph.wipe_batch_size",
                "must be at least 1",
            ));
        }
        if self.benchmark.preview_rows == 0 {
            return Err(ConfigError::invalid(
                "benchmark.preview_rows",
                "must be at least 1",
            ));
        }
        if self.benchmark.preview_chars == 0 {
            return Err(ConfigError::invalid(
                "benchmark.preview_chars",
                "must be at least 1",
            ));
        }
        if self.graph.namespace.is_empty() || self.graph.database.is_empty() {
            return Err(ConfigError::invalid(
                "graph",
                "namespace and database must not be empty",
            ));
        }
        Ok(())
    }

    /// Current configuration rendered as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write a commented example config to `path`, creating parent directories
    pub fn create_example(path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, EXAMPLE_CONFIG).map_err(io_err)
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::invalid(
            format!("{ENV_PREFIX}{name}"),
            format!("cannot parse '{value}'"),
        )
    })
}

const EXAMPLE_CONFIG: &str = r#"# egonet configuration
# Location: ~/.config/egonet/config.toml

[dataset]
# Directory with <egoId>.edges/.featnames/.feat/.egofeat/.circles files
dir = "./gplus"

[ingest]
# Maximum records per write operation
batch_size = 50000
wipe_before_import = false

[graph]
# Uncomment to persist the graph store (requires the rocksdb feature)
# path = "./egonet-graph"
namespace = "egonet"
database = "gplus"
wipe_batch_size = 10000

[relational]
path = "./egonet.db"
wal_mode = true
busy_timeout_ms = 5000
cache_size = -64000

[benchmark]
preview_rows = 3
preview_chars = 200
# output = "benchmark_results.csv"

[logging]
level = "info"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = EgonetConfig::default();
        config.validate().unwrap();
        assert_eq!(config.ingest.batch_size, 50_000);
        assert_eq!(config.graph.wipe_batch_size, 10_000);
        assert_eq!(config.benchmark.preview_rows, 3);
        assert!(config.graph.path.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = EgonetConfig::from_toml_str("[ingest]\nbatch_size = 100\n").unwrap();
        assert_eq!(config.ingest.batch_size, 100);
        assert!(!config.ingest.wipe_before_import);
        assert_eq!(config.relational, RelationalConfig::default());
    }

    #[test]
    fn test_example_config_parses() {
        let config = EgonetConfig::from_toml_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config, EgonetConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EgonetConfig::default();
        config
            .apply_env_overrides(env(&[
                ("EGONET_BATCH_SIZE", "250"),
                ("EGONET_GRAPH_PATH", "/tmp/graph"),
                ("EGONET_LOG_LEVEL", "debug"),
                ("UNRELATED", "x"),
            ]))
            .unwrap();

        assert_eq!(config.ingest.batch_size, 250);
        assert_eq!(config.graph.path, Some(PathBuf::from("/tmp/graph")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = EgonetConfig::default();
        let err = config
            .apply_env_overrides(env(&[("EGONET_BATCH_SIZE", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_zero_batch_size_is_invalid() {
        let mut config = EgonetConfig::default();
        config.ingest.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = EgonetConfig::default();
        config.benchmark.preview_rows = 0;
        assert!(config.validate().is_err());
    }
}

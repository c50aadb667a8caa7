//! Configuration sections, one module per concern

pub mod benchmark;
pub mod dataset;
pub mod ingest;
pub mod logging;
pub mod storage;

pub use benchmark::BenchmarkConfig;
pub use dataset::DatasetConfig;
pub use ingest::IngestConfig;
pub use logging::LoggingConfig;
pub use storage::{GraphConfig, RelationalConfig};

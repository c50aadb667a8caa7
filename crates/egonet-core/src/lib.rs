//! # egonet core
//!
//! Backend-agnostic building blocks for loading ego-network snapshots into
//! more than one store and comparing how those stores answer the same
//! analytical questions.
//!
//! ## Key Components
//!
//! - **Parser**: turns `.edges`, `.featnames`, `.feat`, `.egofeat` and
//!   `.circles` files into canonical records
//! - **EgoNetwork**: the immutable canonical model shared by every store
//! - **ChunkedBatchWriter**: bounded, order-preserving write batches
//! - **EgoNetworkStore / QueryBackend**: the seams each backend implements
//! - **BenchmarkRunner**: timed execution of named query sets
//!
//! ## Usage
//!
//! ```rust,no_run
//! use egonet_core::dataset::{discover_ego_ids, load_ego_network, EgoNetworkFiles};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = Path::new("./gplus");
//! for ego_id in discover_ego_ids(dir)? {
//!     let network = load_ego_network(&EgoNetworkFiles::in_dir(dir, &ego_id))?;
//!     println!("{}: {} users", network.ego_id(), network.user_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod benchmark;
pub mod chunk;
pub mod dataset;
pub mod error;
pub mod model;
pub mod parser;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use benchmark::{
    BenchmarkReport, BenchmarkRunner, Complexity, MetricRecord, NamedQuery, QueryFailure, QuerySet,
    DEFAULT_PREVIEW_CHARS, DEFAULT_PREVIEW_ROWS,
};
pub use chunk::{ChunkedBatchWriter, DEFAULT_BATCH_SIZE};
pub use dataset::{discover_ego_ids, load_ego_network, EgoNetworkFiles};
pub use error::{StoreError, StoreResult};
pub use model::{
    Circle, Edge, EgoNetwork, EgoNetworkBuilder, FeatureKey, FeatureVocabulary, NodeKind,
    ValidationReport,
};
pub use parser::ParseError;
pub use storage::{EgoNetworkStore, IngestStats, QueryBackend};

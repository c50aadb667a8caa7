//! # egonet configuration
//!
//! Type-safe configuration for the loader and benchmark, read from TOML and
//! layered as defaults < config file < `EGONET_*` environment variables. The
//! binary applies command-line flags on top.
//!
//! ```rust,no_run
//! use egonet_config::EgonetConfig;
//!
//! # fn main() -> Result<(), egonet_config::ConfigError> {
//! let config = EgonetConfig::load(None)?;
//! println!("batch size: {}", config.ingest.batch_size);
//! # Ok(())
//! # }
//! ```

pub mod components;
mod error;
mod loader;

pub use components::*;
pub use error::ConfigError;
pub use loader::{EgonetConfig, ENV_PREFIX, TEST_MODE_VAR};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Benchmark reporting settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Rows rendered into each metric's preview column
    pub preview_rows: usize,
    /// Maximum preview length in characters
    pub preview_chars: usize,
    /// Where metrics are written; stdout when unset
    pub output: Option<PathBuf>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            preview_rows: 3,
            preview_chars: 200,
            output: None,
        }
    }
}

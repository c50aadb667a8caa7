use serde::{Deserialize, Serialize};

/// Import behaviour shared by both backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum records per write operation
    pub batch_size: usize,
    /// Clear every store before the first ego network is written
    pub wipe_before_import: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 50_000,
            wipe_before_import: false,
        }
    }
}

//! Dataset location

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Directory holding `<egoId>.edges`, `.featnames`, `.feat`, `.egofeat`
    /// and `.circles` files
    pub dir: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./gplus"),
        }
    }
}

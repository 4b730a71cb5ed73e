//! Configuration for the staging module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where staging namespaces are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Base directory under which one namespace per request is created.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

fn default_base_dir() -> PathBuf {
    std::env::temp_dir().join("rasterbridge")
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

impl StagingConfig {
    /// Sets the base directory.
    pub fn with_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.base_dir = base_dir;
        self
    }
}

//! Configuration for the pipeline module.

use serde::{Deserialize, Serialize};

/// Configuration for the conversion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum concurrent conversions.
    #[serde(default = "default_max_parallel_conversions")]
    pub max_parallel_conversions: usize,

    /// Quality of JPEG pages written by frame extraction (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_max_parallel_conversions() -> usize {
    4
}

fn default_jpeg_quality() -> u8 {
    90
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_parallel_conversions: default_max_parallel_conversions(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl PipelineConfig {
    /// Sets the concurrency limit.
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel_conversions = max;
        self
    }
}

//! Types for the frames module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One extracted frame written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePage {
    /// Zero-based frame index in the source image.
    pub index: usize,
    /// Where the single-frame image was written.
    pub path: PathBuf,
}

impl FramePage {
    /// File name component of the page path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

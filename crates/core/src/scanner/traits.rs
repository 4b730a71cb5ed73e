//! Trait definitions for the scanner module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ScannerError;

/// Verdict of a virus scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    /// The file is clean.
    Clean,
    /// The file is not clean and has been deleted.
    Infected {
        /// Infected file count reported by the scanner, if it could be read.
        infected_files: Option<u64>,
    },
}

impl ScanVerdict {
    /// Whether the file is clean.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// A virus scanner for staged files.
#[async_trait]
pub trait VirusScanner: Send + Sync {
    /// Returns the name of this scanner implementation.
    fn name(&self) -> &str;

    /// Scans a file. Files that are not clean are deleted.
    async fn scan(&self, path: &Path) -> Result<ScanVerdict, ScannerError>;
}

//! Mock virus scanner for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::scanner::{ScanVerdict, ScannerError, VirusScanner};

/// Mock implementation of the VirusScanner trait.
///
/// Returns a configurable verdict and, like a real scanner, deletes files
/// it does not report clean.
#[derive(Debug, Clone)]
pub struct MockScanner {
    /// Verdict returned for every scan.
    verdict: Arc<RwLock<ScanVerdict>>,
    /// Paths that were scanned.
    scanned: Arc<RwLock<Vec<PathBuf>>>,
    /// If set, the next scan will fail with this error.
    next_error: Arc<RwLock<Option<ScannerError>>>,
}

impl Default for MockScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScanner {
    /// Create a scanner that reports every file clean.
    pub fn new() -> Self {
        Self {
            verdict: Arc::new(RwLock::new(ScanVerdict::Clean)),
            scanned: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a scanner that flags every file.
    pub fn infected() -> Self {
        Self {
            verdict: Arc::new(RwLock::new(ScanVerdict::Infected {
                infected_files: Some(1),
            })),
            ..Self::new()
        }
    }

    /// Set the verdict for subsequent scans.
    pub async fn set_verdict(&self, verdict: ScanVerdict) {
        *self.verdict.write().await = verdict;
    }

    /// Configure the next scan to fail with the given error.
    pub async fn set_next_error(&self, error: ScannerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Paths scanned so far.
    pub async fn scanned_paths(&self) -> Vec<PathBuf> {
        self.scanned.read().await.clone()
    }
}

#[async_trait]
impl VirusScanner for MockScanner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn scan(&self, path: &Path) -> Result<ScanVerdict, ScannerError> {
        self.scanned.write().await.push(path.to_path_buf());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let verdict = self.verdict.read().await.clone();
        if !verdict.is_clean() {
            tokio::fs::remove_file(path).await?;
        }
        Ok(verdict)
    }
}

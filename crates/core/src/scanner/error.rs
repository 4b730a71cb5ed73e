//! Error types for the scanner module.

use std::path::PathBuf;
use thiserror::Error;

use crate::converter::ConverterError;

/// Errors that can occur while scanning a file.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// Scanning is enabled but no executable is configured.
    #[error("Virus scanning is enabled but no scanner executable is configured")]
    NotConfigured,

    /// The scanner process could not be run.
    #[error("Scanner process failed: {0}")]
    Process(#[from] ConverterError),

    /// The scanner exited but never wrote its report.
    #[error("Scanner report not found: {path}")]
    ReportMissing { path: PathBuf },

    /// I/O error while handling the report or the scanned file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

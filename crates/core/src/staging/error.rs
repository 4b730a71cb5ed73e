//! Error types for the staging module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while creating, populating or removing a namespace.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The base directory could not be created.
    #[error("Failed to create staging base directory: {path}")]
    BaseDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The namespace directory could not be created.
    #[error("Failed to create staging namespace: {path}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path segment would escape the namespace root.
    #[error("Invalid path segment in staging namespace: {segment:?}")]
    InvalidSegment { segment: String },

    /// Intermediate directories for a staged path could not be created.
    #[error("Failed to prepare staging path: {path}")]
    PrepareFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Recursive removal of the namespace failed.
    #[error("Failed to remove staging namespace: {path}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

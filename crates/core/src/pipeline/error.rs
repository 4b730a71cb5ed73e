//! Error types for the pipeline module.

use thiserror::Error;

use super::types::{ConversionOutcome, FailureKind};
use crate::converter::ConverterError;
use crate::frames::FrameError;
use crate::scanner::ScannerError;
use crate::staging::StagingError;
use crate::validator::ValidationFailure;

/// Errors that end a pipeline run early.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload has no content.
    #[error("The uploaded file is empty")]
    EmptyUpload,

    /// The upload does not match the operation's input format.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// The virus scanner did not report the upload clean.
    #[error("The uploaded file did not pass the virus scan")]
    VirusDetected,

    /// The staging namespace could not be prepared.
    #[error("Staging failed: {0}")]
    Staging(#[from] StagingError),

    /// Frame extraction failed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The converter failed.
    #[error(transparent)]
    Converter(#[from] ConverterError),

    /// The virus scanner could not be run.
    #[error("Virus scan failed: {0}")]
    Scanner(#[from] ScannerError),

    /// The run was cancelled by the caller.
    #[error("Conversion cancelled")]
    Cancelled,

    /// A blocking task panicked or was aborted.
    #[error("Background task failed: {0}")]
    Task(String),

    /// I/O error while staging input or reading output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether the error was caused by the uploaded content.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::EmptyUpload | Self::Validation(_) | Self::VirusDetected => true,
            Self::Frame(e) => e.is_input_error(),
            _ => false,
        }
    }

    /// Classifies a server-side failure.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Converter(ConverterError::ConversionFailed { .. }) => FailureKind::Subprocess,
            Self::Converter(ConverterError::MissingOutput { .. }) => FailureKind::MissingOutput,
            Self::Converter(ConverterError::Timeout { .. }) => FailureKind::Timeout,
            Self::Converter(ConverterError::Cancelled) | Self::Cancelled => FailureKind::Cancelled,
            Self::Scanner(_) => FailureKind::Scanner,
            _ => FailureKind::Internal,
        }
    }

    /// Converts the error into the outcome returned to callers.
    ///
    /// Client errors become `Rejected` with a readable reason. Everything
    /// else becomes `Failed`; converter failures carry the tool's
    /// diagnostic text verbatim.
    pub fn into_outcome(self) -> ConversionOutcome {
        if self.is_client_error() {
            return ConversionOutcome::Rejected {
                reason: self.to_string(),
            };
        }

        let kind = self.failure_kind();
        let diagnostic = match &self {
            Self::Converter(e) => e.diagnostic(),
            other => other.to_string(),
        };
        ConversionOutcome::Failed { kind, diagnostic }
    }
}

//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a finished tool run is classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any non-blank stderr output means failure; the exit code is ignored.
    #[default]
    Stderr,
    /// Only a non-zero exit code means failure; stderr is informational.
    ExitCode,
    /// Either non-blank stderr or a non-zero exit code means failure.
    Either,
}

impl FailurePolicy {
    /// Classifies a finished run.
    ///
    /// A failure carries the raw diagnostic text, or a description of the
    /// exit status when the tool wrote nothing to stderr.
    pub fn classify(&self, run: &ToolRun) -> ExitOutcome {
        let has_diagnostics = !run.diagnostics.trim().is_empty();
        let failed = match self {
            Self::Stderr => has_diagnostics,
            Self::ExitCode => !run.success,
            Self::Either => has_diagnostics || !run.success,
        };

        if !failed {
            ExitOutcome::Success
        } else if has_diagnostics {
            ExitOutcome::Failure(run.diagnostics.clone())
        } else {
            ExitOutcome::Failure(match run.exit_code {
                Some(code) => format!("Converter exited with code {}", code),
                None => "Converter was terminated by a signal".to_string(),
            })
        }
    }
}

/// Outcome of classifying a tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The run succeeded.
    Success,
    /// The run failed, with the diagnostic payload.
    Failure(String),
}

/// Raw result of one child process run.
#[derive(Debug, Clone)]
pub struct ToolRun {
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Whether the exit status reported success.
    pub success: bool,
    /// Everything the process wrote to stderr.
    pub diagnostics: String,
    /// Wall-clock run time in milliseconds.
    pub duration_ms: u64,
}

/// What the converter reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "paths", rename_all = "snake_case")]
pub enum JobInput {
    /// A single document the tool can open directly.
    File(PathBuf),
    /// JPEG pages, assembled in order through `viewjpeg.ps`.
    JpegPages(Vec<PathBuf>),
}

impl JobInput {
    /// All input files of this job.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Self::File(path) => vec![path.as_path()],
            Self::JpegPages(pages) => pages.iter().map(PathBuf::as_path).collect(),
        }
    }
}

/// A conversion job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Unique job identifier.
    pub job_id: String,
    /// Input for the tool.
    pub input: JobInput,
    /// Output file path.
    pub output_path: PathBuf,
    /// Output device name.
    pub device: String,
    /// Rendering resolution in dots per inch.
    pub dpi: u32,
}

impl ConversionJob {
    /// Creates a new job.
    pub fn new(
        job_id: impl Into<String>,
        input: JobInput,
        output_path: PathBuf,
        device: impl Into<String>,
        dpi: u32,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            input,
            output_path,
            device: device.into(),
            dpi,
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Job identifier.
    pub job_id: String,
    /// Path to the produced output file.
    pub output_path: PathBuf,
    /// Output file size in bytes.
    pub output_size_bytes: u64,
    /// Tool run time in milliseconds.
    pub duration_ms: u64,
    /// Stderr text of a run that was still classified as successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

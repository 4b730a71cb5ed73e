//! Types for the pipeline module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::validator::FormatSignature;

/// MIME type of extracted JPEG pages.
pub const JPEG_MIME: &str = "image/jpeg";

/// A conversion the pipeline can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Rasterize a PDF into a TIFF.
    PdfToTiff,
    /// Split a multi-page TIFF into one JPEG per page.
    TiffToJpegs,
    /// Assemble a multi-page TIFF into a PDF.
    TiffToPdf,
}

impl Operation {
    /// All operations.
    pub const ALL: [Operation; 3] = [Self::PdfToTiff, Self::TiffToJpegs, Self::TiffToPdf];

    /// Format the uploaded file must have.
    pub fn input_format(&self) -> FormatSignature {
        match self {
            Self::PdfToTiff => FormatSignature::PDF,
            Self::TiffToJpegs | Self::TiffToPdf => FormatSignature::TIFF,
        }
    }

    /// Stable label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PdfToTiff => "pdf_to_tiff",
            Self::TiffToJpegs => "tiff_to_jpegs",
            Self::TiffToPdf => "tiff_to_pdf",
        }
    }

    /// MIME type of the produced document or pages.
    pub fn output_mime(&self) -> &'static str {
        match self {
            Self::PdfToTiff => "image/tiff",
            Self::TiffToJpegs => JPEG_MIME,
            Self::TiffToPdf => "application/pdf",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|op| op.label() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown operation '{}', expected one of: pdf-to-tiff, tiff-to-jpegs, tiff-to-pdf",
                    s
                )
            })
    }
}

/// A named upload handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name as supplied by the client. Untrusted.
    pub name: String,
    /// Full content.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Creates an upload.
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Size of the content in bytes.
    pub fn byte_len(&self) -> usize {
        self.content.len()
    }

    /// Whether the upload has no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// File name without its extension, used to name outputs.
pub(crate) fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "upload".to_string())
}

/// A single produced document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
    /// Suggested file name.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// Document content.
    pub bytes: Vec<u8>,
}

/// One page produced by frame extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPage {
    /// Zero-based frame index in the source.
    pub index: usize,
    /// Page file name, `{stem}{index}.jpg`.
    pub file_name: String,
    /// JPEG content.
    pub bytes: Vec<u8>,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutput {
    /// A single document.
    Document(OutputDocument),
    /// Ordered pages, one per source frame.
    Pages(Vec<OutputPage>),
}

impl ConversionOutput {
    /// Total size of the produced bytes.
    pub fn total_bytes(&self) -> usize {
        match self {
            Self::Document(doc) => doc.bytes.len(),
            Self::Pages(pages) => pages.iter().map(|p| p.bytes.len()).sum(),
        }
    }
}

/// Category of a server-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The tool run was classified as failed.
    Subprocess,
    /// The tool exited cleanly without writing its output.
    MissingOutput,
    /// The tool exceeded its time limit.
    Timeout,
    /// The caller cancelled the run.
    Cancelled,
    /// The virus scanner could not be run.
    Scanner,
    /// Any other server-side error.
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Subprocess => "subprocess",
            Self::MissingOutput => "missing_output",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Scanner => "scanner",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Terminal result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// The conversion produced output.
    Succeeded(ConversionOutput),
    /// The upload was refused. A client error.
    Rejected { reason: String },
    /// The conversion failed on the server side.
    Failed { kind: FailureKind, diagnostic: String },
}

impl ConversionOutcome {
    /// Label used in metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded(_) => "succeeded",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether the run succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Stage of a pipeline run, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Validating,
    Staging,
    Scanning,
    Extracting,
    Converting,
    Reading,
    CleaningUp,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validating => "validating",
            Self::Staging => "staging",
            Self::Scanning => "scanning",
            Self::Extracting => "extracting",
            Self::Converting => "converting",
            Self::Reading => "reading",
            Self::CleaningUp => "cleaning_up",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parse() {
        assert_eq!("pdf-to-tiff".parse::<Operation>().unwrap(), Operation::PdfToTiff);
        assert_eq!("TIFF_TO_JPEGS".parse::<Operation>().unwrap(), Operation::TiffToJpegs);
        assert_eq!("tiff-to-pdf".parse::<Operation>().unwrap(), Operation::TiffToPdf);
        assert!("png-to-gif".parse::<Operation>().is_err());
    }

    #[test]
    fn test_operation_formats() {
        assert_eq!(Operation::PdfToTiff.input_format().name, "PDF");
        assert_eq!(Operation::TiffToPdf.input_format().name, "TIFF");
        assert_eq!(Operation::PdfToTiff.output_mime(), "image/tiff");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("scan.pdf"), "scan");
        assert_eq!(file_stem("archive.tar.tiff"), "archive.tar");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(""), "upload");
    }

    #[test]
    fn test_outcome_labels() {
        let ok = ConversionOutcome::Succeeded(ConversionOutput::Pages(vec![]));
        assert_eq!(ok.label(), "succeeded");
        assert!(ok.is_success());
        let rejected = ConversionOutcome::Rejected {
            reason: "empty".to_string(),
        };
        assert_eq!(rejected.label(), "rejected");
    }
}

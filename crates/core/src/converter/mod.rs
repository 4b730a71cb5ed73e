//! Converter module for rasterizing documents with an external tool.
//!
//! This module provides the `Converter` trait and a Ghostscript-backed
//! implementation. The tool runs as a child process; its stderr is drained
//! into a diagnostic buffer and the run is classified as success or failure
//! according to the configured [`FailurePolicy`].
//!
//! # Features
//!
//! - PDF to TIFF rasterization (`tiff24nc` device by default)
//! - JPEG pages to PDF through Ghostscript's `viewjpeg.ps`
//! - Bounded run time with forced termination of a hung child
//! - Caller-initiated cancellation
//!
//! # Example
//!
//! ```ignore
//! use rasterbridge_core::converter::{Converter, ConversionJob, GhostscriptConverter, JobInput};
//!
//! let converter = GhostscriptConverter::with_defaults();
//!
//! // Validate gs is available
//! converter.validate().await?;
//!
//! let job = ConversionJob::new(
//!     "job-1",
//!     JobInput::File(PathBuf::from("/tmp/ns/input/scan.pdf")),
//!     PathBuf::from("/tmp/ns/output/scan.tiff"),
//!     "tiff24nc",
//!     500,
//! );
//!
//! let result = converter.convert(job).await?;
//! println!("Rasterized in {} ms", result.duration_ms);
//! ```

mod config;
mod error;
mod ghostscript;
mod process;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ghostscript::GhostscriptConverter;
pub use process::run_tool;
pub use traits::Converter;
pub use types::{ConversionJob, ConversionResult, ExitOutcome, FailurePolicy, JobInput, ToolRun};

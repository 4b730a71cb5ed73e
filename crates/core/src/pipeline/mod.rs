//! Conversion pipeline.
//!
//! Composes the staging area, content validator, optional virus scanner,
//! frame extractor and converter into the three supported operations.
//! Every run ends in a [`ConversionOutcome`]; the staging namespace is
//! removed before the outcome is returned.

mod config;
mod error;
mod pipeline;
mod types;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::ConversionPipeline;
pub use types::{
    ConversionOutcome, ConversionOutput, FailureKind, Operation, OutputDocument, OutputPage,
    PipelineState, UploadedFile,
};

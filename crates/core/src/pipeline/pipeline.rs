//! Conversion pipeline implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::cancel::CancelSignal;
use crate::config::Config;
use crate::converter::{
    ConversionJob, Converter, ConverterError, GhostscriptConverter, JobInput,
};
use crate::frames::{FrameExtractor, FramePage};
use crate::metrics;
use crate::scanner::{create_scanner, ScannerError, VirusScanner};
use crate::staging::{sanitize_file_name, StagingArea, StagingError, StagingNamespace};
use crate::validator::{ContentValidator, FormatSignature};

use super::error::PipelineError;
use super::types::{
    file_stem, ConversionOutcome, ConversionOutput, Operation, OutputDocument, OutputPage,
    PipelineState, UploadedFile,
};

/// Runs uploads through validation, staging, conversion and cleanup.
pub struct ConversionPipeline<C: Converter> {
    converter: Arc<C>,
    scanner: Option<Arc<dyn VirusScanner>>,
    staging: StagingArea,
    extractor: FrameExtractor,
    device: String,
    pdf_device: String,
    dpi: u32,
    conversion_semaphore: Arc<Semaphore>,
}

impl ConversionPipeline<GhostscriptConverter> {
    /// Builds a Ghostscript-backed pipeline, with the scanner the
    /// configuration selects.
    pub fn from_config(config: &Config) -> Result<Self, ScannerError> {
        let converter = GhostscriptConverter::new(config.converter.clone());
        let pipeline = Self::new(config, converter);
        Ok(match create_scanner(&config.scanner)? {
            Some(scanner) => pipeline.with_scanner(scanner),
            None => pipeline,
        })
    }
}

impl<C: Converter + 'static> ConversionPipeline<C> {
    /// Creates a pipeline around `converter`.
    pub fn new(config: &Config, converter: C) -> Self {
        Self {
            converter: Arc::new(converter),
            scanner: None,
            staging: StagingArea::new(config.staging.clone()),
            extractor: FrameExtractor::new(config.pipeline.jpeg_quality),
            device: config.converter.device.clone(),
            pdf_device: config.converter.pdf_device.clone(),
            dpi: config.converter.dpi,
            conversion_semaphore: Arc::new(Semaphore::new(
                config.pipeline.max_parallel_conversions.max(1),
            )),
        }
    }

    /// Enables virus scanning of staged uploads.
    pub fn with_scanner(mut self, scanner: Arc<dyn VirusScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Returns the staging area.
    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Checks the converter and makes sure the staging base exists.
    pub async fn validate(&self) -> Result<(), PipelineError> {
        self.converter.validate().await?;
        let base = self.staging.base_dir();
        tokio::fs::create_dir_all(base)
            .await
            .map_err(|source| StagingError::BaseDirFailed {
                path: base.to_path_buf(),
                source,
            })?;
        Ok(())
    }

    /// Runs one operation on an upload.
    pub async fn run(&self, operation: Operation, upload: UploadedFile) -> ConversionOutcome {
        self.run_with_cancel(operation, upload, CancelSignal::never())
            .await
    }

    /// Runs one operation on an upload, aborting when `cancel` fires.
    ///
    /// Cancellation kills a running converter child; the staging namespace
    /// is removed before this returns.
    pub async fn run_with_cancel(
        &self,
        operation: Operation,
        upload: UploadedFile,
        cancel: CancelSignal,
    ) -> ConversionOutcome {
        let job_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "conversion",
            job_id = %job_id,
            operation = %operation,
            file = %upload.name
        );

        async move {
            let start = Instant::now();
            let outcome = match self.execute(operation, upload, &job_id, cancel).await {
                Ok(output) => {
                    info!(
                        bytes = output.total_bytes(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Conversion succeeded"
                    );
                    ConversionOutcome::Succeeded(output)
                }
                Err(e) if e.is_client_error() => {
                    warn!(reason = %e, "Upload rejected");
                    e.into_outcome()
                }
                Err(e) => {
                    let outcome = e.into_outcome();
                    if let ConversionOutcome::Failed { kind, diagnostic } = &outcome {
                        error!(kind = %kind, diagnostic = %diagnostic, "Conversion failed");
                    }
                    outcome
                }
            };

            metrics::CONVERSIONS_TOTAL
                .with_label_values(&[operation.label(), outcome.label()])
                .inc();
            metrics::CONVERSION_DURATION
                .with_label_values(&[operation.label()])
                .observe(start.elapsed().as_secs_f64());

            outcome
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        operation: Operation,
        upload: UploadedFile,
        job_id: &str,
        mut cancel: CancelSignal,
    ) -> Result<ConversionOutput, PipelineError> {
        debug!(state = %PipelineState::Validating, bytes = upload.byte_len());
        if upload.is_empty() {
            return Err(PipelineError::EmptyUpload);
        }
        ContentValidator::new(operation.input_format()).check(&upload.name, &upload.content)?;

        let _permit = tokio::select! {
            permit = self.conversion_semaphore.acquire() => {
                permit.map_err(|_| PipelineError::Cancelled)?
            }
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
        };

        debug!(state = %PipelineState::Staging);
        let mut namespace = self.staging.create().await?;

        // A dropped future leaves cleanup to the namespace's Drop.
        let result = self
            .execute_staged(operation, upload, job_id, &namespace, cancel)
            .await;

        debug!(state = %PipelineState::CleaningUp, namespace = %namespace.id());
        if let Err(e) = namespace.destroy().await {
            warn!(error = %e, "Failed to remove staging namespace");
        }

        result
    }

    async fn execute_staged(
        &self,
        operation: Operation,
        upload: UploadedFile,
        job_id: &str,
        namespace: &StagingNamespace,
        cancel: CancelSignal,
    ) -> Result<ConversionOutput, PipelineError> {
        let UploadedFile { name, content } = upload;
        let file_name = sanitize_file_name(&name);
        let stem = file_stem(&file_name);

        let input_path = namespace.path(&["input", &file_name]).await?;
        tokio::fs::write(&input_path, &content).await?;

        if let Some(scanner) = &self.scanner {
            debug!(state = %PipelineState::Scanning, scanner = scanner.name());
            if !scanner.scan(&input_path).await?.is_clean() {
                return Err(PipelineError::VirusDetected);
            }
        }

        match operation {
            Operation::PdfToTiff => {
                let output_name =
                    format!("{}.{}", stem, FormatSignature::TIFF.preferred_extension());
                let output_path = namespace.path(&["output", &output_name]).await?;
                let job = ConversionJob::new(
                    job_id,
                    JobInput::File(input_path),
                    output_path,
                    self.device.as_str(),
                    self.dpi,
                );
                let bytes = self.convert(job, cancel).await?;
                Ok(ConversionOutput::Document(OutputDocument {
                    file_name: output_name,
                    mime_type: operation.output_mime(),
                    bytes,
                }))
            }
            Operation::TiffToJpegs => {
                let frames_dir = namespace.dir(&["frames"]).await?;
                let pages = self.extract_frames(content, &stem, frames_dir).await?;
                if cancel.is_cancelled() {
                    return Err(PipelineError::Cancelled);
                }

                debug!(state = %PipelineState::Reading, pages = pages.len());
                let mut output = Vec::with_capacity(pages.len());
                for page in pages {
                    output.push(OutputPage {
                        index: page.index,
                        file_name: page.file_name(),
                        bytes: tokio::fs::read(&page.path).await?,
                    });
                }
                Ok(ConversionOutput::Pages(output))
            }
            Operation::TiffToPdf => {
                let frames_dir = namespace.dir(&["frames"]).await?;
                let pages = self.extract_frames(content, &stem, frames_dir).await?;
                if cancel.is_cancelled() {
                    return Err(PipelineError::Cancelled);
                }

                let output_name =
                    format!("{}.{}", stem, FormatSignature::PDF.preferred_extension());
                let output_path = namespace.path(&["output", &output_name]).await?;
                let job = ConversionJob::new(
                    job_id,
                    JobInput::JpegPages(pages.into_iter().map(|p| p.path).collect()),
                    output_path,
                    self.pdf_device.as_str(),
                    self.dpi,
                );
                let bytes = self.convert(job, cancel).await?;
                Ok(ConversionOutput::Document(OutputDocument {
                    file_name: output_name,
                    mime_type: operation.output_mime(),
                    bytes,
                }))
            }
        }
    }

    /// Runs the converter and reads the file it produced.
    async fn convert(
        &self,
        job: ConversionJob,
        cancel: CancelSignal,
    ) -> Result<Vec<u8>, PipelineError> {
        debug!(state = %PipelineState::Converting, device = %job.device, dpi = job.dpi);
        let result = self.converter.convert_with_cancel(job, cancel).await?;

        debug!(state = %PipelineState::Reading, output = %result.output_path.display());
        match tokio::fs::read(&result.output_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConverterError::MissingOutput {
                    path: result.output_path,
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Extracts frames on the blocking pool.
    async fn extract_frames(
        &self,
        content: Vec<u8>,
        stem: &str,
        out_dir: PathBuf,
    ) -> Result<Vec<FramePage>, PipelineError> {
        debug!(state = %PipelineState::Extracting);
        let extractor = self.extractor;
        let stem = stem.to_string();
        let pages = tokio::task::spawn_blocking(move || extractor.extract(&content, &stem, &out_dir))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))??;
        debug!(pages = pages.len(), "Extracted frames");
        Ok(pages)
    }
}

//! Mock converter for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::cancel::CancelSignal;
use crate::converter::{ConversionJob, ConversionResult, Converter, ConverterError};

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Whether every input file existed when the job was submitted.
    pub inputs_present: bool,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Simulate success/failure
/// - Control the bytes written to the job's output path
/// - Simulate slow conversions (honouring cancellation)
///
/// # Example
///
/// ```rust,ignore
/// use rasterbridge_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.set_next_error(ConverterError::conversion_failed(
///     "converter reported errors",
///     Some("Error: /undefined\n".to_string()),
/// )).await;
///
/// let result = converter.convert(job).await;
/// assert!(result.is_err());
/// assert_eq!(converter.conversion_count().await, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Bytes written to the output path; `None` writes nothing.
    output: Arc<RwLock<Option<Vec<u8>>>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
    /// If set, `validate` fails.
    validation_error: Arc<RwLock<Option<String>>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            output: Arc::new(RwLock::new(Some(b"mock output".to_vec()))),
            conversion_duration_ms: Arc::new(RwLock::new(0)),
            validation_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the bytes written to the output path of successful jobs.
    pub async fn set_output(&self, bytes: Vec<u8>) {
        *self.output.write().await = Some(bytes);
    }

    /// Make successful jobs produce no output file.
    pub async fn set_no_output(&self) {
        *self.output.write().await = None;
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Make `validate` fail with the given reason.
    pub async fn set_validation_error(&self, reason: impl Into<String>) {
        *self.validation_error.write().await = Some(reason.into());
    }

    /// Paths of all outputs the mock was asked to write.
    pub async fn output_paths(&self) -> Vec<PathBuf> {
        self.conversions
            .read()
            .await
            .iter()
            .map(|c| c.job.output_path.clone())
            .collect()
    }

    async fn record(&self, job: &ConversionJob, inputs_present: bool, success: bool) {
        self.conversions.write().await.push(RecordedConversion {
            job: job.clone(),
            inputs_present,
            success,
        });
    }

    async fn produce(
        &self,
        job: &ConversionJob,
        mut cancel: CancelSignal,
    ) -> Result<ConversionResult, ConverterError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let duration_ms = *self.conversion_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(duration_ms)) => {}
                _ = cancel.cancelled() => return Err(ConverterError::Cancelled),
            }
        }

        let output = self.output.read().await.clone();
        let output_size_bytes = match output {
            Some(bytes) => {
                if let Some(parent) = job.output_path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&job.output_path, &bytes).await?;
                bytes.len() as u64
            }
            None => 0,
        };

        Ok(ConversionResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes,
            duration_ms,
            diagnostics: None,
        })
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert_with_cancel(
        &self,
        job: ConversionJob,
        cancel: CancelSignal,
    ) -> Result<ConversionResult, ConverterError> {
        let mut inputs_present = true;
        for path in job.input.paths() {
            inputs_present &= tokio::fs::try_exists(path).await.unwrap_or(false);
        }

        let result = self.produce(&job, cancel).await;
        self.record(&job, inputs_present, result.is_ok()).await;
        result
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        match self.validation_error.read().await.clone() {
            Some(reason) => Err(ConverterError::invalid_job(reason)),
            None => Ok(()),
        }
    }
}

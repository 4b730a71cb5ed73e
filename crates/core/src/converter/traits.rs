//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{ConversionJob, ConversionResult};
use crate::cancel::CancelSignal;

/// A converter that drives an external rasterization tool.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Runs a conversion job to completion.
    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        self.convert_with_cancel(job, CancelSignal::never()).await
    }

    /// Runs a conversion job, aborting it when `cancel` fires.
    ///
    /// On cancellation the child process is terminated and
    /// [`ConverterError::Cancelled`] is returned.
    async fn convert_with_cancel(
        &self,
        job: ConversionJob,
        cancel: CancelSignal,
    ) -> Result<ConversionResult, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::JobInput;
    use std::path::PathBuf;

    struct EchoConverter;

    #[async_trait]
    impl Converter for EchoConverter {
        fn name(&self) -> &str {
            "echo"
        }

        async fn convert_with_cancel(
            &self,
            job: ConversionJob,
            cancel: CancelSignal,
        ) -> Result<ConversionResult, ConverterError> {
            if cancel.is_cancelled() {
                return Err(ConverterError::Cancelled);
            }
            Ok(ConversionResult {
                job_id: job.job_id,
                output_path: job.output_path,
                output_size_bytes: 512,
                duration_ms: 1,
                diagnostics: None,
            })
        }

        async fn validate(&self) -> Result<(), ConverterError> {
            Ok(())
        }
    }

    fn job(id: &str) -> ConversionJob {
        ConversionJob::new(
            id,
            JobInput::File(PathBuf::from("/in.pdf")),
            PathBuf::from("/out.tiff"),
            "tiff24nc",
            500,
        )
    }

    #[tokio::test]
    async fn test_default_convert_never_cancels() {
        let result = EchoConverter.convert(job("test-job")).await.unwrap();
        assert_eq!(result.job_id, "test-job");
        assert_eq!(result.output_path, PathBuf::from("/out.tiff"));
    }

    #[tokio::test]
    async fn test_convert_with_cancel_honours_signal() {
        let (handle, signal) = crate::cancel::cancel_pair();
        handle.cancel();
        let err = EchoConverter
            .convert_with_cancel(job("cancelled"), signal)
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::Cancelled));
    }
}

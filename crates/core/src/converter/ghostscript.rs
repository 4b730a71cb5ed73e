//! Ghostscript-based converter implementation.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::Duration;
use tracing::{debug, error};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::process::run_tool;
use super::traits::Converter;
use super::types::{ConversionJob, ConversionResult, ExitOutcome, JobInput};
use crate::cancel::CancelSignal;
use crate::metrics;

/// Prefix of the output file switch.
const OUTPUT_FILE_SWITCH: &str = "-sOutputFile=";

/// PostScript program bundled with Ghostscript that renders JPEG files.
const VIEWJPEG_PROGRAM: &str = "viewjpeg.ps";

/// Ghostscript-based converter implementation.
pub struct GhostscriptConverter {
    config: ConverterConfig,
}

impl GhostscriptConverter {
    /// Creates a new Ghostscript converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Builds the Ghostscript argument list for a job.
    ///
    /// The order is fixed: no-pause, quiet, device, resolution, batch,
    /// extra args, output file, then the input.
    pub fn build_args(&self, job: &ConversionJob) -> Result<Vec<String>, ConverterError> {
        let mut args = vec![
            "-dNOPAUSE".to_string(),
            "-q".to_string(),
            format!("-sDEVICE={}", job.device),
            format!("-r{}", job.dpi),
            "-dBATCH".to_string(),
        ];

        // Extra args
        args.extend(self.config.extra_args.iter().cloned());

        // Output
        args.push(format!(
            "{}{}",
            OUTPUT_FILE_SWITCH,
            job.output_path.to_string_lossy()
        ));

        // Input
        match &job.input {
            JobInput::File(path) => args.push(path.to_string_lossy().to_string()),
            JobInput::JpegPages(pages) => {
                if pages.is_empty() {
                    return Err(ConverterError::invalid_job("no pages to assemble"));
                }

                // SAFER mode only lets viewjpeg.ps open files under permitted dirs.
                let dirs: BTreeSet<_> = pages.iter().filter_map(|p| p.parent()).collect();
                for dir in dirs {
                    args.push(format!(
                        "--permit-file-read={}{}",
                        dir.to_string_lossy(),
                        std::path::MAIN_SEPARATOR
                    ));
                }

                let program = pages
                    .iter()
                    .map(|page| format!("({}) viewJPEG showpage", escape_ps_string(page)))
                    .collect::<Vec<_>>()
                    .join(" ");

                args.extend([VIEWJPEG_PROGRAM.to_string(), "-c".to_string(), program]);
            }
        }

        Ok(args)
    }

    /// Renders the job as a single quoted command line.
    ///
    /// For a single-file job this is exactly
    /// `-dNOPAUSE -q -sDEVICE=<device> -r<dpi> -dBATCH -sOutputFile="<out>" "<in>"`.
    /// The child process itself receives the unquoted argument vector.
    pub fn command_line(&self, job: &ConversionJob) -> Result<String, ConverterError> {
        let args = self.build_args(job)?;
        Ok(args
            .iter()
            .map(|arg| quote_arg(arg))
            .collect::<Vec<_>>()
            .join(" "))
    }

    /// Checks that every input exists and the output directory is ready.
    async fn prepare(&self, job: &ConversionJob) -> Result<(), ConverterError> {
        for path in job.input.paths() {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(ConverterError::InputNotFound {
                    path: path.to_path_buf(),
                });
            }
        }

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                ConverterError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        Ok(())
    }

    async fn run_conversion(
        &self,
        job: &ConversionJob,
        cancel: CancelSignal,
    ) -> Result<ConversionResult, ConverterError> {
        self.prepare(job).await?;

        let args = self.build_args(job)?;
        debug!(
            job_id = %job.job_id,
            command = %self.command_line(job)?,
            "Running converter"
        );

        let run = match run_tool(
            &self.config.executable_path,
            &args,
            Duration::from_secs(self.config.timeout_secs),
            cancel,
        )
        .await
        {
            Ok(run) => run,
            Err(e) => {
                let label = match &e {
                    ConverterError::Timeout { .. } => "timeout",
                    ConverterError::Cancelled => "cancelled",
                    _ => "error",
                };
                metrics::TOOL_RUNS.with_label_values(&[label]).inc();
                return Err(e);
            }
        };

        if let ExitOutcome::Failure(diagnostic) = self.config.failure_policy.classify(&run) {
            metrics::TOOL_RUNS.with_label_values(&["failure"]).inc();
            error!(
                job_id = %job.job_id,
                exit_code = ?run.exit_code,
                diagnostic = %diagnostic,
                "Converter reported failure"
            );
            return Err(ConverterError::conversion_failed(
                "converter reported errors",
                Some(diagnostic),
            ));
        }
        metrics::TOOL_RUNS.with_label_values(&["success"]).inc();

        // Verify output exists and get size
        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| ConverterError::MissingOutput {
                path: job.output_path.clone(),
            })?;

        let diagnostics = Some(run.diagnostics).filter(|d| !d.trim().is_empty());
        if let Some(text) = &diagnostics {
            debug!(job_id = %job.job_id, diagnostics = %text, "Converter wrote to stderr");
        }

        Ok(ConversionResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: run.duration_ms,
            diagnostics,
        })
    }
}

#[async_trait]
impl Converter for GhostscriptConverter {
    fn name(&self) -> &str {
        "ghostscript"
    }

    async fn convert_with_cancel(
        &self,
        job: ConversionJob,
        cancel: CancelSignal,
    ) -> Result<ConversionResult, ConverterError> {
        self.run_conversion(&job, cancel).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let output = Command::new(&self.config.executable_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::ExecutableNotFound {
                        path: self.config.executable_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConverterError::conversion_failed(
                format!(
                    "{} --version exited with {:?}",
                    self.config.executable_path.display(),
                    output.status.code()
                ),
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            ));
        }

        debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "Converter available"
        );
        Ok(())
    }
}

/// Quotes the value of `-sOutputFile=` and every non-switch argument.
fn quote_arg(arg: &str) -> String {
    if let Some(path) = arg.strip_prefix(OUTPUT_FILE_SWITCH) {
        format!("{}\"{}\"", OUTPUT_FILE_SWITCH, path)
    } else if arg.starts_with('-') {
        arg.to_string()
    } else {
        format!("\"{}\"", arg)
    }
}

/// Escapes a path for use inside a PostScript string literal.
fn escape_ps_string(path: &Path) -> String {
    let mut escaped = String::new();
    for c in path.to_string_lossy().chars() {
        if matches!(c, '(' | ')' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pdf_job() -> ConversionJob {
        ConversionJob::new(
            "job-1",
            JobInput::File(PathBuf::from("/tmp/ns/input/scan.pdf")),
            PathBuf::from("/tmp/ns/output/scan.tiff"),
            "tiff24nc",
            500,
        )
    }

    #[test]
    fn test_build_args_order() {
        let converter = GhostscriptConverter::with_defaults();
        let args = converter.build_args(&pdf_job()).unwrap();

        assert_eq!(
            args,
            vec![
                "-dNOPAUSE",
                "-q",
                "-sDEVICE=tiff24nc",
                "-r500",
                "-dBATCH",
                "-sOutputFile=/tmp/ns/output/scan.tiff",
                "/tmp/ns/input/scan.pdf",
            ]
        );
    }

    #[test]
    fn test_command_line_matches_tool_contract() {
        let converter = GhostscriptConverter::with_defaults();
        let line = converter.command_line(&pdf_job()).unwrap();
        assert_eq!(
            line,
            r#"-dNOPAUSE -q -sDEVICE=tiff24nc -r500 -dBATCH -sOutputFile="/tmp/ns/output/scan.tiff" "/tmp/ns/input/scan.pdf""#
        );
    }

    #[test]
    fn test_extra_args_precede_output() {
        let mut config = ConverterConfig::default();
        config.extra_args = vec!["-dSAFER".to_string()];
        let converter = GhostscriptConverter::new(config);

        let args = converter.build_args(&pdf_job()).unwrap();
        let extra = args.iter().position(|a| a == "-dSAFER").unwrap();
        let output = args.iter().position(|a| a.starts_with("-sOutputFile=")).unwrap();
        assert!(extra < output);
    }

    #[test]
    fn test_build_args_jpeg_pages() {
        let converter = GhostscriptConverter::with_defaults();
        let job = ConversionJob::new(
            "job-2",
            JobInput::JpegPages(vec![
                PathBuf::from("/ns/frames/fax0.jpg"),
                PathBuf::from("/ns/frames/fax1.jpg"),
            ]),
            PathBuf::from("/ns/output/fax.pdf"),
            "pdfwrite",
            500,
        );

        let args = converter.build_args(&job).unwrap();
        assert_eq!(args[2], "-sDEVICE=pdfwrite");
        assert_eq!(args[5], "-sOutputFile=/ns/output/fax.pdf");
        assert_eq!(args[6], format!("--permit-file-read=/ns/frames{}", std::path::MAIN_SEPARATOR));
        assert_eq!(args[7], "viewjpeg.ps");
        assert_eq!(args[8], "-c");
        assert_eq!(
            args[9],
            "(/ns/frames/fax0.jpg) viewJPEG showpage (/ns/frames/fax1.jpg) viewJPEG showpage"
        );
    }

    #[test]
    fn test_empty_pages_rejected() {
        let converter = GhostscriptConverter::with_defaults();
        let job = ConversionJob::new(
            "job-3",
            JobInput::JpegPages(vec![]),
            PathBuf::from("/ns/output/x.pdf"),
            "pdfwrite",
            500,
        );
        assert!(matches!(
            converter.build_args(&job),
            Err(ConverterError::InvalidJob { .. })
        ));
    }

    #[test]
    fn test_escape_ps_string() {
        assert_eq!(escape_ps_string(Path::new("/a/b (1).jpg")), r"/a/b \(1\).jpg");
        assert_eq!(escape_ps_string(Path::new(r"C:\x.jpg")), r"C:\\x.jpg");
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_spawn() {
        let converter = GhostscriptConverter::new(ConverterConfig::with_executable(
            PathBuf::from("/nonexistent/gs"),
        ));
        let err = converter.convert(pdf_job()).await.unwrap_err();
        assert!(matches!(err, ConverterError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_validate_missing_executable() {
        let converter = GhostscriptConverter::new(ConverterConfig::with_executable(
            PathBuf::from("/nonexistent/gs"),
        ));
        assert!(matches!(
            converter.validate().await,
            Err(ConverterError::ExecutableNotFound { .. })
        ));
    }
}

//! Scanner backed by a command-line antivirus tool.
//!
//! The tool is invoked as `<file> /p=1 /r=<report>` and is expected to
//! write a text report next to the scanned file. The report is polled for
//! after the process exits, since some scanners flush it asynchronously.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::ScannerConfig;
use super::error::ScannerError;
use super::traits::{ScanVerdict, VirusScanner};
use crate::cancel::CancelSignal;
use crate::converter::run_tool;

static INFECTED_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Infected files:\s*(\d+)").unwrap());

/// Virus scanner that shells out to an external executable.
pub struct CommandScanner {
    executable: PathBuf,
    config: ScannerConfig,
}

impl CommandScanner {
    /// Creates a scanner from configuration.
    pub fn new(config: ScannerConfig) -> Result<Self, ScannerError> {
        let executable = config
            .executable_path
            .clone()
            .ok_or(ScannerError::NotConfigured)?;
        Ok(Self { executable, config })
    }

    /// Path of the report written for `file`.
    pub fn report_path(file: &Path) -> PathBuf {
        let mut report = OsString::from(file.as_os_str());
        report.push(".report");
        PathBuf::from(report)
    }

    /// Arguments passed to the scanner for `file`.
    pub fn build_args(file: &Path, report: &Path) -> Vec<String> {
        vec![
            file.display().to_string(),
            "/p=1".to_string(),
            format!("/r={}", report.display()),
        ]
    }

    async fn wait_for_report(&self, report: &Path) -> bool {
        let interval = Duration::from_millis(self.config.report_poll_interval_ms);
        for _ in 0..self.config.report_poll_attempts {
            if tokio::fs::try_exists(report).await.unwrap_or(false) {
                return true;
            }
            tokio::time::sleep(interval).await;
        }
        tokio::fs::try_exists(report).await.unwrap_or(false)
    }
}

/// Reads the infected file count from a scanner report.
pub(crate) fn infected_count(report: &str) -> Option<u64> {
    INFECTED_COUNT
        .captures(report)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

async fn remove_if_present(path: &Path) -> Result<(), ScannerError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl VirusScanner for CommandScanner {
    fn name(&self) -> &str {
        "command"
    }

    async fn scan(&self, path: &Path) -> Result<ScanVerdict, ScannerError> {
        let report = Self::report_path(path);
        let args = Self::build_args(path, &report);

        let run = run_tool(
            &self.executable,
            &args,
            Duration::from_secs(self.config.timeout_secs),
            CancelSignal::never(),
        )
        .await?;
        debug!(
            file = %path.display(),
            exit_code = ?run.exit_code,
            duration_ms = run.duration_ms,
            "Scanner finished"
        );

        if !self.wait_for_report(&report).await {
            return Err(ScannerError::ReportMissing { path: report });
        }

        let contents = tokio::fs::read_to_string(&report).await?;
        let clean = contents.contains(&self.config.clean_marker);

        let verdict = if clean {
            ScanVerdict::Clean
        } else {
            let infected_files = infected_count(&contents);
            warn!(file = %path.display(), ?infected_files, "Scanner flagged file, deleting");
            remove_if_present(path).await?;
            ScanVerdict::Infected { infected_files }
        };

        remove_if_present(&report).await?;
        info!(file = %path.display(), clean, "Scan complete");
        Ok(verdict)
    }
}

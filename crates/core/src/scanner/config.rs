//! Configuration for the scanner module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the command-line virus scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Whether uploads are scanned at all.
    #[serde(default)]
    pub enabled: bool,

    /// Path to the scanner executable.
    #[serde(default)]
    pub executable_path: Option<PathBuf>,

    /// How many times to look for the report file after the scanner exits.
    #[serde(default = "default_poll_attempts")]
    pub report_poll_attempts: u32,

    /// Delay between report file checks in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub report_poll_interval_ms: u64,

    /// Text in the report that marks a clean file.
    #[serde(default = "default_clean_marker")]
    pub clean_marker: String,

    /// Timeout for the scanner process in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_poll_attempts() -> u32 {
    100
}

fn default_poll_interval() -> u64 {
    100
}

fn default_clean_marker() -> String {
    "Infected files: 0".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            executable_path: None,
            report_poll_attempts: default_poll_attempts(),
            report_poll_interval_ms: default_poll_interval(),
            clean_marker: default_clean_marker(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ScannerConfig {
    /// Creates an enabled config using the given scanner executable.
    pub fn enabled_with(executable_path: PathBuf) -> Self {
        Self {
            enabled: true,
            executable_path: Some(executable_path),
            ..Default::default()
        }
    }

    /// Sets the report polling schedule.
    pub fn with_polling(mut self, attempts: u32, interval_ms: u64) -> Self {
        self.report_poll_attempts = attempts;
        self.report_poll_interval_ms = interval_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert!(!config.enabled);
        assert!(config.executable_path.is_none());
        assert_eq!(config.report_poll_attempts, 100);
        assert_eq!(config.report_poll_interval_ms, 100);
        assert_eq!(config.clean_marker, "Infected files: 0");
    }

    #[test]
    fn test_polling_builder() {
        let config = ScannerConfig::enabled_with(PathBuf::from("/bin/scan")).with_polling(5, 10);
        assert!(config.enabled);
        assert_eq!(config.report_poll_attempts, 5);
        assert_eq!(config.report_poll_interval_ms, 10);
    }
}

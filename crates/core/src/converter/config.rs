//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::FailurePolicy;

/// Configuration for the Ghostscript-based converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to the Ghostscript executable.
    #[serde(default = "default_executable_path")]
    pub executable_path: PathBuf,

    /// Output device for raster conversions.
    #[serde(default = "default_device")]
    pub device: String,

    /// Output device for PDF assembly.
    #[serde(default = "default_pdf_device")]
    pub pdf_device: String,

    /// Rendering resolution in dots per inch.
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Timeout for a single tool run in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How a finished run is classified as success or failure.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Additional arguments inserted before the output file argument.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_executable_path() -> PathBuf {
    PathBuf::from("gs")
}

fn default_device() -> String {
    "tiff24nc".to_string()
}

fn default_pdf_device() -> String {
    "pdfwrite".to_string()
}

fn default_dpi() -> u32 {
    500
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            executable_path: default_executable_path(),
            device: default_device(),
            pdf_device: default_pdf_device(),
            dpi: default_dpi(),
            timeout_secs: default_timeout(),
            failure_policy: FailurePolicy::default(),
            extra_args: Vec::new(),
        }
    }
}

impl ConverterConfig {
    /// Creates a new config with a custom executable path.
    pub fn with_executable(executable_path: PathBuf) -> Self {
        Self {
            executable_path,
            ..Default::default()
        }
    }

    /// Sets the rendering resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the failure classification policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConverterConfig::default();
        assert_eq!(config.executable_path, PathBuf::from("gs"));
        assert_eq!(config.device, "tiff24nc");
        assert_eq!(config.pdf_device, "pdfwrite");
        assert_eq!(config.dpi, 500);
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.failure_policy, FailurePolicy::Stderr);
        assert!(config.extra_args.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = ConverterConfig::with_executable(PathBuf::from("/usr/local/bin/gs"))
            .with_dpi(300)
            .with_timeout(30)
            .with_failure_policy(FailurePolicy::Either);

        assert_eq!(config.executable_path, PathBuf::from("/usr/local/bin/gs"));
        assert_eq!(config.dpi, 300);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.failure_policy, FailurePolicy::Either);
    }

    #[test]
    fn test_config_serialization() {
        let config = ConverterConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ConverterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.dpi, config.dpi);
        assert_eq!(parsed.failure_policy, config.failure_policy);
    }

    #[test]
    fn test_failure_policy_from_toml() {
        let config: ConverterConfig = toml::from_str(r#"failure_policy = "exit_code""#).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::ExitCode);
        assert_eq!(config.device, "tiff24nc");
    }
}

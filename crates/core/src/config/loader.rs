use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment variable overrides.
const ENV_PREFIX: &str = "RASTERBRIDGE_";

/// Nested keys are separated by a double underscore, since field names
/// contain single underscores (`RASTERBRIDGE_CONVERTER__TIMEOUT_SECS`).
const ENV_SEPARATOR: &str = "__";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from environment variables only, defaults elsewhere
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::new()
        .merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::FailurePolicy;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.converter.device, "tiff24nc");
        assert_eq!(config.converter.dpi, 500);
        assert!(!config.scanner.enabled);
        assert_eq!(config.pipeline.max_parallel_conversions, 4);
    }

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[converter]
executable_path = "/usr/local/bin/gs"
dpi = 300
failure_policy = "exit_code"

[staging]
base_dir = "/var/tmp/rasterbridge"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(
            config.converter.executable_path,
            PathBuf::from("/usr/local/bin/gs")
        );
        assert_eq!(config.converter.dpi, 300);
        assert_eq!(config.converter.failure_policy, FailurePolicy::ExitCode);
        assert_eq!(config.converter.device, "tiff24nc");
        assert_eq!(
            config.staging.base_dir,
            PathBuf::from("/var/tmp/rasterbridge")
        );
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[converter]
dpi = "high"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[converter]
timeout_secs = 60

[scanner]
enabled = true
executable_path = "/opt/scanner/scan"

[pipeline]
jpeg_quality = 80
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.converter.timeout_secs, 60);
        assert!(config.scanner.enabled);
        assert_eq!(
            config.scanner.executable_path,
            Some(PathBuf::from("/opt/scanner/scan"))
        );
        assert_eq!(config.scanner.report_poll_attempts, 100);
        assert_eq!(config.pipeline.jpeg_quality, 80);
    }
}

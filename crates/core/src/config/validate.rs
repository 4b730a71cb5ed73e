use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Converter dpi, timeout and device names
/// - Pipeline concurrency and JPEG quality
/// - Scanner executable when scanning is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    // Converter validation
    if config.converter.dpi == 0 {
        return invalid("converter.dpi cannot be 0");
    }
    if config.converter.timeout_secs == 0 {
        return invalid("converter.timeout_secs cannot be 0");
    }
    if config.converter.device.trim().is_empty() {
        return invalid("converter.device cannot be empty");
    }
    if config.converter.pdf_device.trim().is_empty() {
        return invalid("converter.pdf_device cannot be empty");
    }

    // Pipeline validation
    if config.pipeline.max_parallel_conversions == 0 {
        return invalid("pipeline.max_parallel_conversions cannot be 0");
    }
    if !(1..=100).contains(&config.pipeline.jpeg_quality) {
        return invalid("pipeline.jpeg_quality must be between 1 and 100");
    }

    // Scanner validation
    if config.scanner.enabled && config.scanner.executable_path.is_none() {
        return invalid("scanner.executable_path is required when scanner.enabled is true");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConverterConfig, PipelineConfig, ScannerConfig};

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_dpi_zero_fails() {
        let config = Config {
            converter: ConverterConfig::default().with_dpi(0),
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_parallelism_fails() {
        let config = Config {
            pipeline: PipelineConfig::default().with_max_parallel(0),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_jpeg_quality_out_of_range() {
        let config = Config {
            pipeline: PipelineConfig {
                jpeg_quality: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_enabled_scanner_needs_executable() {
        let config = Config {
            scanner: ScannerConfig {
                enabled: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("scanner.executable_path"));
    }
}

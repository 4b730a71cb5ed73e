//! Optional virus scanning of staged uploads.
//!
//! Scanning is off by default. When enabled, the pipeline hands the staged
//! input file to a [`VirusScanner`] before any conversion work; a file that
//! is not reported clean is deleted and the request is rejected.

mod command;
mod config;
mod error;
mod traits;

pub use command::CommandScanner;
pub use config::ScannerConfig;
pub use error::ScannerError;
pub use traits::{ScanVerdict, VirusScanner};

use std::sync::Arc;

/// Creates the scanner selected by the configuration.
///
/// Returns `None` when scanning is disabled.
pub fn create_scanner(config: &ScannerConfig) -> Result<Option<Arc<dyn VirusScanner>>, ScannerError> {
    if !config.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(CommandScanner::new(config.clone())?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_disabled_scanner_is_none() {
        let scanner = create_scanner(&ScannerConfig::default()).unwrap();
        assert!(scanner.is_none());
    }

    #[test]
    fn test_enabled_without_executable_fails() {
        let config = ScannerConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(matches!(
            create_scanner(&config),
            Err(ScannerError::NotConfigured)
        ));
    }

    #[test]
    fn test_enabled_with_executable() {
        let config = ScannerConfig::enabled_with(PathBuf::from("/opt/scanner/scan"));
        let scanner = create_scanner(&config).unwrap().unwrap();
        assert_eq!(scanner.name(), "command");
    }
}

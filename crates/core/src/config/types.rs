use serde::{Deserialize, Serialize};

pub use crate::converter::ConverterConfig;
pub use crate::pipeline::PipelineConfig;
pub use crate::scanner::ScannerConfig;
pub use crate::staging::StagingConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

pub mod cancel;
pub mod config;
pub mod converter;
pub mod frames;
pub mod metrics;
pub mod pipeline;
pub mod scanner;
pub mod staging;
pub mod testing;
pub mod validator;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
};
pub use converter::{Converter, ConverterError, GhostscriptConverter};
pub use pipeline::{
    ConversionOutcome, ConversionOutput, ConversionPipeline, FailureKind, Operation, PipelineError,
    UploadedFile,
};
pub use scanner::{create_scanner, VirusScanner};

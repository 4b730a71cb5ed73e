mod metrics;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rasterbridge_core::{
    cancel_pair, load_config, load_config_from_env, validate_config, Config, ConversionOutcome,
    ConversionPipeline, Operation, UploadedFile,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit code for a rejected upload.
const EXIT_REJECTED: u8 = 2;

/// Exit code for a failed conversion.
const EXIT_FAILED: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "rasterbridge", version, about = "Convert between PDF, TIFF and JPEG pages")]
struct Cli {
    /// Configuration file (TOML). Environment variables override it.
    #[arg(short, long, env = "RASTERBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Print Prometheus metrics to stdout when done.
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a file.
    Convert {
        /// pdf-to-tiff, tiff-to-jpegs or tiff-to-pdf.
        operation: Operation,

        /// File to convert.
        input: PathBuf,

        /// Directory the result is written to.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Check that the converter is installed and the staging directory is usable.
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!("rasterbridge {}", VERSION);

    let config = load(&cli)?;
    validate_config(&config).context("Configuration validation failed")?;

    let pipeline =
        ConversionPipeline::from_config(&config).context("Failed to create virus scanner")?;

    let code = match cli.command {
        Command::Check => {
            pipeline
                .validate()
                .await
                .context("Converter check failed")?;
            info!(
                executable = %config.converter.executable_path.display(),
                staging = %pipeline.staging().base_dir().display(),
                "Converter ready"
            );
            ExitCode::SUCCESS
        }
        Command::Convert {
            operation,
            input,
            output_dir,
        } => convert(&pipeline, operation, input, output_dir).await?,
    };

    if cli.metrics {
        print!("{}", metrics::render().context("Failed to encode metrics")?);
    }

    Ok(code)
}

fn load(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => load_config_from_env().context("Failed to load config from environment"),
    }
}

async fn convert<C>(
    pipeline: &ConversionPipeline<C>,
    operation: Operation,
    input: PathBuf,
    output_dir: PathBuf,
) -> Result<ExitCode>
where
    C: rasterbridge_core::Converter + 'static,
{
    let content = tokio::fs::read(&input)
        .await
        .with_context(|| format!("Failed to read {:?}", input))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let upload = UploadedFile::new(name, content);

    let (handle, cancel) = cancel_pair();
    let ctrl_c = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling conversion");
            handle.cancel();
        }
    });

    let outcome = pipeline.run_with_cancel(operation, upload, cancel).await;
    ctrl_c.abort();

    match outcome {
        ConversionOutcome::Succeeded(result) => {
            let written = output::write_output(&output_dir, &result)
                .await
                .with_context(|| format!("Failed to write output to {:?}", output_dir))?;
            for path in &written {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        ConversionOutcome::Rejected { reason } => {
            eprintln!("rejected: {}", reason);
            Ok(ExitCode::from(EXIT_REJECTED))
        }
        ConversionOutcome::Failed { kind, diagnostic } => {
            eprintln!("failed ({}): {}", kind, diagnostic.trim_end());
            Ok(ExitCode::from(EXIT_FAILED))
        }
    }
}

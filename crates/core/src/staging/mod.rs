//! Per-request staging namespaces.
//!
//! Every conversion gets its own directory under the configured base dir,
//! named by a random UUID. All files produced while handling the request
//! (the uploaded input, converter output, extracted frames) live under that
//! directory, and the whole tree is removed when the request ends.
//!
//! # Example
//!
//! ```ignore
//! use rasterbridge_core::staging::{StagingArea, StagingConfig};
//!
//! let area = StagingArea::new(StagingConfig::default());
//! let mut namespace = area.create().await?;
//!
//! let input = namespace.path(&["input", "scan.pdf"]).await?;
//! tokio::fs::write(&input, &bytes).await?;
//!
//! // ... run the conversion ...
//!
//! namespace.destroy().await?;
//! ```

mod area;
mod config;
mod error;

pub use area::{sanitize_file_name, StagingArea, StagingNamespace};
pub use config::StagingConfig;
pub use error::StagingError;

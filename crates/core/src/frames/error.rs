//! Error types for the frames module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The source could not be decoded as a multi-frame image.
    #[error("Failed to decode image: {reason}")]
    Decode { reason: String },

    /// A frame uses a pixel layout that cannot be rendered to JPEG.
    #[error("Frame {frame} has unsupported color type {color_type}")]
    UnsupportedColorType { frame: usize, color_type: String },

    /// Encoding a frame as JPEG failed.
    #[error("Failed to encode frame {frame}: {reason}")]
    Encode { frame: usize, reason: String },

    /// Writing a frame to disk failed.
    #[error("Failed to write frame to {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FrameError {
    /// Creates a decode error.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Whether the failure is caused by the uploaded content rather than
    /// the server.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::UnsupportedColorType { .. }
        )
    }
}

impl From<tiff::TiffError> for FrameError {
    fn from(err: tiff::TiffError) -> Self {
        Self::decode(err.to_string())
    }
}

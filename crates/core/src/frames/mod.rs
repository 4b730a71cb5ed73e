//! Multi-frame image decomposition.
//!
//! Decodes a multi-page TIFF and writes every frame as its own JPEG file,
//! in frame order, holding at most one decoded frame in memory at a time.

mod error;
mod extractor;
mod types;

pub use error::FrameError;
pub use extractor::{count_frames, FrameExtractor};
pub use types::FramePage;

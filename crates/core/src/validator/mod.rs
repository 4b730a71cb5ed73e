//! Upload content validation.
//!
//! Checks an uploaded file's name and leading bytes against the format an
//! operation expects, before any staging or subprocess work happens.

mod signature;
mod types;

pub use signature::{read_signature, ContentValidator};
pub use types::{FormatSignature, ValidationFailure};

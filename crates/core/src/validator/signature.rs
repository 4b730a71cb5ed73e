//! Signature checks against uploaded content.

use std::io::{Cursor, ErrorKind, Read};
use tracing::debug;

use super::types::{FormatSignature, ValidationFailure};

/// Reads exactly `len` bytes from the start of `reader`.
///
/// Short reads are retried until `len` bytes have arrived. Returns `None` if
/// the stream ends first.
pub fn read_signature<R: Read>(mut reader: R, len: usize) -> std::io::Result<Option<Vec<u8>>> {
    let mut buf = vec![0u8; len];
    let mut filled = 0;

    while filled < len {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok(None),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(Some(buf))
}

/// Checks uploads against one expected format.
#[derive(Debug, Clone, Copy)]
pub struct ContentValidator {
    signature: FormatSignature,
}

impl ContentValidator {
    /// Creates a validator for the given format.
    pub fn new(signature: FormatSignature) -> Self {
        Self { signature }
    }

    /// Checks the name first, then the leading bytes.
    ///
    /// The content is read through a fresh cursor, so the caller's buffer is
    /// left untouched for the rest of the pipeline.
    pub fn check(&self, file_name: &str, content: &[u8]) -> Result<(), ValidationFailure> {
        let format = self.signature.name;

        if !self.signature.matches_extension(file_name) {
            return Err(ValidationFailure::WrongExtension {
                format,
                expected: self
                    .signature
                    .extensions
                    .iter()
                    .map(|e| format!(".{}", e))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        // Reading from an in-memory cursor cannot fail.
        let prefix = read_signature(Cursor::new(content), self.signature.magic_len())
            .ok()
            .flatten();

        match prefix {
            None => Err(ValidationFailure::Truncated { format }),
            Some(bytes) if self.signature.matches_magic(&bytes) => Ok(()),
            Some(bytes) => {
                debug!(format, leading = ?bytes, "Upload signature mismatch");
                Err(ValidationFailure::SignatureMismatch { format })
            }
        }
    }

    /// Whether the upload is of the expected format.
    pub fn is_expected_format(&self, file_name: &str, content: &[u8]) -> bool {
        self.check(file_name, content).is_ok()
    }
}

//! Types for the validator module.

use thiserror::Error;

/// File name and magic-byte signature of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSignature {
    /// Human readable format name.
    pub name: &'static str,
    /// Accepted file extensions, lowercase, without the dot.
    pub extensions: &'static [&'static str],
    /// Accepted leading byte sequences. All must have the same length.
    pub magics: &'static [&'static [u8]],
}

impl FormatSignature {
    /// PDF: `.pdf`, starting with `%PDF-`.
    pub const PDF: FormatSignature = FormatSignature {
        name: "PDF",
        extensions: &["pdf"],
        magics: &[b"%PDF-"],
    };

    /// TIFF: `.tif`/`.tiff`, little- or big-endian header.
    pub const TIFF: FormatSignature = FormatSignature {
        name: "TIFF",
        extensions: &["tif", "tiff"],
        magics: &[b"II*\0", b"MM\0*"],
    };

    /// Number of leading bytes that must be read to check the signature.
    pub fn magic_len(&self) -> usize {
        self.magics.first().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether `file_name` carries one of the accepted extensions.
    ///
    /// Matching is case-insensitive.
    pub fn matches_extension(&self, file_name: &str) -> bool {
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.extensions
            .iter()
            .any(|expected| ext.eq_ignore_ascii_case(expected))
    }

    /// Whether `prefix` equals one of the accepted magic sequences.
    pub fn matches_magic(&self, prefix: &[u8]) -> bool {
        self.magics.iter().any(|magic| *magic == prefix)
    }

    /// Extension to use for files of this format.
    pub fn preferred_extension(&self) -> &'static str {
        self.extensions.last().copied().unwrap_or("bin")
    }
}

/// Why an upload did not match the expected format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// The file name does not end with an accepted extension.
    #[error("You must upload a {format} file (expected extension: {expected})")]
    WrongExtension {
        format: &'static str,
        expected: String,
    },

    /// The content ended before the signature could be read.
    #[error("The uploaded file is too short to be a {format} file")]
    Truncated { format: &'static str },

    /// The leading bytes do not match the signature.
    #[error("The uploaded file is not a valid {format} file")]
    SignatureMismatch { format: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert!(FormatSignature::PDF.matches_extension("scan.pdf"));
        assert!(FormatSignature::PDF.matches_extension("SCAN.PDF"));
        assert!(FormatSignature::PDF.matches_extension("archive.v2.Pdf"));
        assert!(!FormatSignature::PDF.matches_extension("scan.txt"));
        assert!(!FormatSignature::PDF.matches_extension("pdf"));
        assert!(!FormatSignature::PDF.matches_extension("scan.pdf.txt"));
    }

    #[test]
    fn test_tiff_accepts_both_extensions() {
        assert!(FormatSignature::TIFF.matches_extension("fax.tif"));
        assert!(FormatSignature::TIFF.matches_extension("fax.TIFF"));
        assert_eq!(FormatSignature::TIFF.preferred_extension(), "tiff");
    }

    #[test]
    fn test_magic_len() {
        assert_eq!(FormatSignature::PDF.magic_len(), 5);
        assert_eq!(FormatSignature::TIFF.magic_len(), 4);
    }

    #[test]
    fn test_tiff_byte_orders() {
        assert!(FormatSignature::TIFF.matches_magic(b"II*\0"));
        assert!(FormatSignature::TIFF.matches_magic(b"MM\0*"));
        assert!(!FormatSignature::TIFF.matches_magic(b"II\0*"));
    }
}

//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the converter and scanner
//! traits plus synthetic image fixtures, so the pipeline can be exercised
//! without Ghostscript or an antivirus installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use rasterbridge_core::testing::{fixtures, MockConverter};
//!
//! let converter = MockConverter::new();
//! converter.set_output(fixtures::multi_page_tiff(&[[0, 0, 0]])).await;
//!
//! let pipeline = ConversionPipeline::new(&config, converter);
//! let outcome = pipeline.run(Operation::PdfToTiff, upload).await;
//! ```

mod mock_converter;
mod mock_scanner;

pub use mock_converter::{MockConverter, RecordedConversion};
pub use mock_scanner::MockScanner;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::Cursor;
    use tiff::encoder::{colortype, TiffEncoder};

    /// Width of every fixture frame.
    pub const FRAME_WIDTH: u32 = 32;
    /// Height of every fixture frame.
    pub const FRAME_HEIGHT: u32 = 24;

    /// Create a TIFF with one solid RGB frame per entry of `colors`.
    pub fn multi_page_tiff(colors: &[[u8; 3]]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buf).unwrap();
            for color in colors {
                let data: Vec<u8> = color
                    .iter()
                    .copied()
                    .cycle()
                    .take((FRAME_WIDTH * FRAME_HEIGHT * 3) as usize)
                    .collect();
                encoder
                    .write_image::<colortype::RGB8>(FRAME_WIDTH, FRAME_HEIGHT, &data)
                    .unwrap();
            }
        }
        buf.into_inner()
    }

    /// Create an 8-bit grayscale TIFF with `frames` frames of distinct shades.
    pub fn gray_tiff(frames: usize) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buf).unwrap();
            for i in 0..frames {
                let shade = (i * 255 / frames.max(1)) as u8;
                let data = vec![shade; (FRAME_WIDTH * FRAME_HEIGHT) as usize];
                encoder
                    .write_image::<colortype::Gray8>(FRAME_WIDTH, FRAME_HEIGHT, &data)
                    .unwrap();
            }
        }
        buf.into_inner()
    }

    /// Side length of the square fax fixture frames.
    pub const FAX_SIDE: u32 = 8;

    /// Create a little-endian, CCITT Group 4 compressed, bilevel TIFF with
    /// `pages` all-white `FAX_SIDE` x `FAX_SIDE` frames.
    pub fn fax_g4_tiff(pages: usize) -> Vec<u8> {
        // Every row of an all-white page against an all-white reference
        // line is a single V0 code (`1`), followed by EOFB.
        const STRIP: [u8; 4] = [0xFF, 0x00, 0x10, 0x01];
        const ENTRIES: u16 = 9;
        const IFD_LEN: u32 = 2 + ENTRIES as u32 * 12 + 4;
        const PAGE_LEN: u32 = IFD_LEN + STRIP.len() as u32;

        fn entry(buf: &mut Vec<u8>, tag: u16, kind: u16, value: u32) {
            buf.extend_from_slice(&tag.to_le_bytes());
            buf.extend_from_slice(&kind.to_le_bytes());
            buf.extend_from_slice(&1u32.to_le_bytes());
            buf.extend_from_slice(&value.to_le_bytes());
        }
        const SHORT: u16 = 3;
        const LONG: u16 = 4;

        let mut buf = b"II*\0".to_vec();
        buf.extend_from_slice(&8u32.to_le_bytes());
        for page in 0..pages as u32 {
            let ifd_offset = 8 + page * PAGE_LEN;
            buf.extend_from_slice(&ENTRIES.to_le_bytes());
            entry(&mut buf, 256, SHORT, FAX_SIDE); // ImageWidth
            entry(&mut buf, 257, SHORT, FAX_SIDE); // ImageLength
            entry(&mut buf, 258, SHORT, 1); // BitsPerSample
            entry(&mut buf, 259, SHORT, 4); // Compression: CCITT T.6
            entry(&mut buf, 262, SHORT, 0); // Photometric: WhiteIsZero
            entry(&mut buf, 273, LONG, ifd_offset + IFD_LEN); // StripOffsets
            entry(&mut buf, 277, SHORT, 1); // SamplesPerPixel
            entry(&mut buf, 278, SHORT, FAX_SIDE); // RowsPerStrip
            entry(&mut buf, 279, LONG, STRIP.len() as u32); // StripByteCounts
            let next = if page + 1 < pages as u32 {
                ifd_offset + PAGE_LEN
            } else {
                0
            };
            buf.extend_from_slice(&next.to_le_bytes());
            buf.extend_from_slice(&STRIP);
        }
        buf
    }

    /// A minimal single-page PDF.
    pub fn minimal_pdf() -> Vec<u8> {
        b"%PDF-1.4\n\
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n\
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 72 72] >> endobj\n\
trailer << /Root 1 0 R >>\n\
%%EOF\n"
            .to_vec()
    }

}

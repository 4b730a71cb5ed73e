//! TIFF frame extraction.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage, RgbaImage};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;
use tracing::debug;

use super::error::FrameError;
use super::types::FramePage;

/// Default JPEG quality for extracted pages.
const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Counts the frames (IFDs) of a TIFF without decoding pixel data.
///
/// Opening the decoder reads the first IFD, so a readable TIFF always has
/// at least one frame.
pub fn count_frames(image_bytes: &[u8]) -> Result<usize, FrameError> {
    let mut decoder = Decoder::new(Cursor::new(image_bytes))?;
    let mut count = 1;
    while decoder.more_images() {
        decoder.next_image()?;
        count += 1;
    }
    Ok(count)
}

/// Splits multi-frame images into single-frame JPEG files.
#[derive(Debug, Clone, Copy)]
pub struct FrameExtractor {
    jpeg_quality: u8,
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameExtractor {
    /// Creates an extractor writing JPEGs at the given quality (1-100).
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Path of the page for `index`, derived from the source base name.
    pub fn page_path(out_dir: &Path, base_name: &str, index: usize) -> PathBuf {
        out_dir.join(format!("{}{}.jpg", base_name, index))
    }

    /// Decodes `image_bytes` and writes every frame to `out_dir` as
    /// `{base_name}{index}.jpg`.
    ///
    /// This is CPU-bound and blocking; async callers should run it on
    /// `spawn_blocking`.
    pub fn extract(
        &self,
        image_bytes: &[u8],
        base_name: &str,
        out_dir: &Path,
    ) -> Result<Vec<FramePage>, FrameError> {
        let frame_count = count_frames(image_bytes)?;
        debug!(frame_count, base_name, "Extracting frames");

        let mut decoder = Decoder::new(Cursor::new(image_bytes))?;
        let mut pages = Vec::with_capacity(frame_count);

        for index in 0..frame_count {
            if index > 0 {
                decoder.next_image()?;
            }

            // The decoded buffer is dropped at the end of each iteration.
            let frame = Self::render_frame(&mut decoder, index)?;
            let path = Self::page_path(out_dir, base_name, index);
            self.write_jpeg(&frame, index, &path)?;

            debug!(
                index,
                width = frame.width(),
                height = frame.height(),
                path = %path.display(),
                "Wrote frame"
            );
            pages.push(FramePage { index, path });
        }

        Ok(pages)
    }

    /// Decodes the active frame into an RGB bitmap.
    fn render_frame(
        decoder: &mut Decoder<Cursor<&[u8]>>,
        index: usize,
    ) -> Result<RgbImage, FrameError> {
        let (width, height) = decoder.dimensions()?;
        let color_type = decoder.colortype()?;
        let data = decoder.read_image()?;

        let unsupported = || FrameError::UnsupportedColorType {
            frame: index,
            color_type: format!("{:?}", color_type),
        };
        let short_buffer =
            || FrameError::decode(format!("Frame {} has a truncated pixel buffer", index));

        let image = match (color_type, data) {
            (ColorType::Gray(1), DecodingResult::U8(buf)) => {
                DynamicImage::ImageLuma8(unpack_bilevel(width, height, &buf).ok_or_else(short_buffer)?)
            }
            (ColorType::Gray(8), DecodingResult::U8(buf)) => DynamicImage::ImageLuma8(
                GrayImage::from_raw(width, height, buf).ok_or_else(short_buffer)?,
            ),
            (ColorType::GrayA(8), DecodingResult::U8(buf)) => DynamicImage::ImageLumaA8(
                GrayAlphaImage::from_raw(width, height, buf).ok_or_else(short_buffer)?,
            ),
            (ColorType::RGB(8), DecodingResult::U8(buf)) => DynamicImage::ImageRgb8(
                RgbImage::from_raw(width, height, buf).ok_or_else(short_buffer)?,
            ),
            (ColorType::RGBA(8), DecodingResult::U8(buf)) => DynamicImage::ImageRgba8(
                RgbaImage::from_raw(width, height, buf).ok_or_else(short_buffer)?,
            ),
            (ColorType::CMYK(8), DecodingResult::U8(buf)) => {
                DynamicImage::ImageRgb8(cmyk_to_rgb(width, height, &buf).ok_or_else(short_buffer)?)
            }
            (ColorType::Gray(16), DecodingResult::U16(buf)) => DynamicImage::ImageLuma16(
                ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, buf)
                    .ok_or_else(short_buffer)?,
            ),
            (ColorType::RGB(16), DecodingResult::U16(buf)) => DynamicImage::ImageRgb16(
                ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(width, height, buf)
                    .ok_or_else(short_buffer)?,
            ),
            _ => return Err(unsupported()),
        };

        Ok(image.into_rgb8())
    }

    fn write_jpeg(&self, frame: &RgbImage, index: usize, path: &Path) -> Result<(), FrameError> {
        let io_err = |source| FrameError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);

        JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality)
            .encode_image(frame)
            .map_err(|e| FrameError::Encode {
                frame: index,
                reason: e.to_string(),
            })?;

        writer.flush().map_err(io_err)
    }
}

/// Expands a 1-bit, byte-aligned-row bitmap to 8-bit gray.
fn unpack_bilevel(width: u32, height: u32, packed: &[u8]) -> Option<GrayImage> {
    let row_bytes = (width as usize).div_ceil(8);
    if packed.len() < row_bytes * height as usize {
        return None;
    }

    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for row in packed.chunks(row_bytes).take(height as usize) {
        for x in 0..width as usize {
            let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
            pixels.push(if bit == 1 { 255 } else { 0 });
        }
    }
    GrayImage::from_raw(width, height, pixels)
}

/// Naive CMYK to RGB conversion.
fn cmyk_to_rgb(width: u32, height: u32, cmyk: &[u8]) -> Option<RgbImage> {
    let expected = width as usize * height as usize * 4;
    if cmyk.len() < expected {
        return None;
    }

    let rgb = cmyk[..expected]
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u16;
            [px[0], px[1], px[2]].map(|c| (((255 - c as u16) * k) / 255) as u8)
        })
        .collect();
    RgbImage::from_raw(width, height, rgb)
}

//! # Bitmap Transcoding
//!
//! Converts a one-bit-per-pixel image into the printer's chunked bitmap
//! format:
//!
//! ```text
//! DC2 * rows row_bytes   d[0] d[1] ... d[rows * row_bytes - 1]
//! DC2 * rows row_bytes   ...
//! ```
//!
//! ## Bit Packing
//!
//! Each row is `ceil(width / 8)` bytes, MSB first:
//! - Bit 7 = leftmost pixel of the byte
//! - 1 = ink, 0 = paper
//! - Bits past the image width are padded with 0
//!
//! ```text
//! width 10, all ink:  11111111 11000000  ->  0xFF 0xC0
//! ```
//!
//! ## Limits
//!
//! | Property | Value |
//! |----------|-------|
//! | Print width | 384 dots (48 bytes), wider rows are clipped |
//! | Rows per chunk | 255 (or 1 in line-at-a-time mode) |
//!
//! Line-at-a-time mode sends one row per chunk. It avoids the visible feed
//! gaps between large chunks at the cost of a header per row.

use image::{DynamicImage, GrayImage};
use rayon::prelude::*;

use super::commands;
use crate::error::TermicaError;
use crate::render::dither;

/// Maximum bytes per printed row
pub const MAX_ROW_BYTES: usize = 48;

/// Maximum printable width in dots
pub const MAX_WIDTH_DOTS: usize = MAX_ROW_BYTES * 8;

/// Maximum rows in one `DC2 *` chunk
pub const MAX_CHUNK_HEIGHT: usize = 255;

// ============================================================================
// PIXEL SOURCES
// ============================================================================

/// A monochrome image addressable by pixel.
pub trait BitmapSource {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// `true` if the pixel at `(x, y)` should be inked.
    fn is_ink(&self, x: usize, y: usize) -> bool;
}

/// # Packed Monochrome Bitmap
///
/// Row-major, `ceil(width / 8)` bytes per row, MSB = leftmost pixel.
///
/// ```
/// use termica::protocol::graphics::{Bitmap, BitmapSource};
///
/// let mut bitmap = Bitmap::new(10, 2);
/// bitmap.set(9, 1, true);
/// assert!(bitmap.is_ink(9, 1));
/// assert_eq!(bitmap.as_bytes(), &[0x00, 0x00, 0x00, 0x40]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    row_bytes: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Blank (all paper) bitmap
    pub fn new(width: usize, height: usize) -> Self {
        let row_bytes = width.div_ceil(8);
        Self {
            width,
            height,
            row_bytes,
            data: vec![0; row_bytes * height],
        }
    }

    /// Wrap already packed rows.
    ///
    /// ## Errors
    ///
    /// `InvalidCommand` if `data` is not exactly `ceil(width / 8) * height`
    /// bytes.
    pub fn from_packed(width: usize, height: usize, data: Vec<u8>) -> Result<Self, TermicaError> {
        let row_bytes = width.div_ceil(8);
        if data.len() != row_bytes * height {
            return Err(TermicaError::InvalidCommand(format!(
                "Bitmap data length mismatch. Expected {} ({} bytes × {} rows), got {}",
                row_bytes * height,
                row_bytes,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            row_bytes,
            data,
        })
    }

    /// Build a bitmap from a per-pixel predicate.
    pub fn from_fn<F>(width: usize, height: usize, ink: F) -> Self
    where
        F: Fn(usize, usize) -> bool,
    {
        let mut bitmap = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if ink(x, y) {
                    bitmap.set(x, y, true);
                }
            }
        }
        bitmap
    }

    /// Hard threshold: pixels darker than `threshold` become ink.
    pub fn from_luma(img: &GrayImage, threshold: u8) -> Self {
        let (w, h) = img.dimensions();
        Self::from_fn(w as usize, h as usize, |x, y| {
            img.get_pixel(x as u32, y as u32)[0] < threshold
        })
    }

    /// Convert any decoded image with Bayer ordered dithering.
    ///
    /// Rows are computed in parallel.
    pub fn from_image(img: &DynamicImage) -> Self {
        let gray = img.to_luma8();
        let (w, h) = gray.dimensions();
        let mut bitmap = Self::new(w as usize, h as usize);
        if bitmap.row_bytes == 0 {
            return bitmap;
        }

        let row_bytes = bitmap.row_bytes;
        bitmap
            .data
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..w as usize {
                    let luma = gray.get_pixel(x as u32, y as u32)[0];
                    if dither::should_print(x, y, dither::luma_intensity(luma)) {
                        row[x / 8] |= 0x80 >> (x % 8);
                    }
                }
            });
        bitmap
    }

    /// Set or clear one pixel. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, ink: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.row_bytes + x / 8;
        let bit = 0x80 >> (x % 8);
        if ink {
            self.data[idx] |= bit;
        } else {
            self.data[idx] &= !bit;
        }
    }

    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl BitmapSource for Bitmap {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn is_ink(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[y * self.row_bytes + x / 8] & (0x80 >> (x % 8)) != 0
    }
}

// ============================================================================
// WIRE LAYOUT
// ============================================================================

/// Row and chunk dimensions for one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapLayout {
    /// `ceil(width / 8)`
    pub row_bytes: usize,
    /// `min(row_bytes, 48)`, the bytes actually sent per row
    pub row_bytes_clipped: usize,
    /// 1 in line-at-a-time mode, else 255
    pub max_chunk_height: usize,
}

impl BitmapLayout {
    pub fn new(width: usize, line_at_a_time: bool) -> Self {
        let row_bytes = width.div_ceil(8);
        Self {
            row_bytes,
            row_bytes_clipped: row_bytes.min(MAX_ROW_BYTES),
            max_chunk_height: if line_at_a_time { 1 } else { MAX_CHUNK_HEIGHT },
        }
    }

    /// Chunk header for a chunk of `rows` rows
    pub fn header(&self, rows: usize) -> [u8; 4] {
        commands::bitmap_header(rows as u8, self.row_bytes_clipped as u8)
    }
}

/// Split `height` rows into `(first_row, rows)` chunks of at most `max_rows`.
///
/// ```
/// use termica::protocol::graphics::chunk_rows;
///
/// let chunks: Vec<_> = chunk_rows(600, 255).collect();
/// assert_eq!(chunks, vec![(0, 255), (255, 255), (510, 90)]);
/// assert_eq!(chunk_rows(0, 255).count(), 0);
/// ```
pub fn chunk_rows(height: usize, max_rows: usize) -> impl Iterator<Item = (usize, usize)> {
    let max_rows = max_rows.max(1);
    (0..height)
        .step_by(max_rows)
        .map(move |start| (start, (height - start).min(max_rows)))
}

/// Pack row `y` into `row_bytes` bytes.
///
/// Every pixel up to `row_bytes * 8` is read; pixels at or past the source
/// width are paper.
pub fn pack_row<S>(source: &S, y: usize, row_bytes: usize) -> Vec<u8>
where
    S: BitmapSource + ?Sized,
{
    let width = source.width();
    let mut row = vec![0u8; row_bytes];
    for x in 0..(row_bytes * 8).min(width) {
        if source.is_ink(x, y) {
            row[x / 8] |= 0x80 >> (x % 8);
        }
    }
    row
}

/// Encode a whole image into the chunked wire format in one buffer.
///
/// This is the byte stream [`crate::printer::Printer::print_bitmap`] sends,
/// without the pacing.
///
/// ```
/// use termica::protocol::graphics::{encode, Bitmap};
///
/// let bitmap = Bitmap::from_fn(10, 2, |_, _| true);
/// assert_eq!(
///     encode(&bitmap, false),
///     vec![0x12, 0x2A, 2, 2, 0xFF, 0xC0, 0xFF, 0xC0]
/// );
/// ```
pub fn encode<S>(source: &S, line_at_a_time: bool) -> Vec<u8>
where
    S: BitmapSource + ?Sized,
{
    let layout = BitmapLayout::new(source.width(), line_at_a_time);
    let mut out = Vec::new();
    for (start, rows) in chunk_rows(source.height(), layout.max_chunk_height) {
        out.extend_from_slice(&layout.header(rows));
        for y in start..start + rows {
            let row = pack_row(source, y, layout.row_bytes);
            out.extend_from_slice(&row[..layout.row_bytes_clipped]);
        }
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_layout_narrow() {
        let layout = BitmapLayout::new(10, false);
        assert_eq!(layout.row_bytes, 2);
        assert_eq!(layout.row_bytes_clipped, 2);
        assert_eq!(layout.max_chunk_height, 255);
    }

    #[test]
    fn test_layout_clips_wide_rows() {
        let layout = BitmapLayout::new(500, true);
        assert_eq!(layout.row_bytes, 63);
        assert_eq!(layout.row_bytes_clipped, 48);
        assert_eq!(layout.max_chunk_height, 1);
    }

    #[test]
    fn test_layout_exact_width() {
        let layout = BitmapLayout::new(384, false);
        assert_eq!(layout.row_bytes, 48);
        assert_eq!(layout.row_bytes_clipped, 48);
    }

    #[test]
    fn test_chunk_rows_exact_multiple() {
        let chunks: Vec<_> = chunk_rows(510, 255).collect();
        assert_eq!(chunks, vec![(0, 255), (255, 255)]);
    }

    #[test]
    fn test_chunk_rows_line_at_a_time() {
        let chunks: Vec<_> = chunk_rows(3, 1).collect();
        assert_eq!(chunks, vec![(0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_pack_row_pads_past_width() {
        let bitmap = Bitmap::from_fn(10, 1, |_, _| true);
        assert_eq!(pack_row(&bitmap, 0, 2), vec![0xFF, 0xC0]);
    }

    #[test]
    fn test_pack_row_pattern() {
        let bitmap = Bitmap::from_fn(8, 1, |x, _| x % 2 == 0);
        assert_eq!(pack_row(&bitmap, 0, 1), vec![0xAA]);
    }

    #[test]
    fn test_from_packed_length_check() {
        assert!(Bitmap::from_packed(10, 2, vec![0; 4]).is_ok());
        assert!(matches!(
            Bitmap::from_packed(10, 2, vec![0; 3]),
            Err(TermicaError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_set_and_clear() {
        let mut bitmap = Bitmap::new(16, 1);
        bitmap.set(0, 0, true);
        bitmap.set(15, 0, true);
        assert_eq!(bitmap.as_bytes(), &[0x80, 0x01]);
        bitmap.set(0, 0, false);
        assert_eq!(bitmap.as_bytes(), &[0x00, 0x01]);
        // Out of range is ignored
        bitmap.set(16, 0, true);
        bitmap.set(0, 1, true);
        assert_eq!(bitmap.as_bytes(), &[0x00, 0x01]);
    }

    #[test]
    fn test_encode_empty_height() {
        let bitmap = Bitmap::new(100, 0);
        assert!(encode(&bitmap, false).is_empty());
    }

    #[test]
    fn test_encode_clips_to_48_bytes() {
        let bitmap = Bitmap::from_fn(400, 3, |_, _| true);
        let out = encode(&bitmap, false);
        assert_eq!(&out[..4], &[0x12, 0x2A, 3, 48]);
        assert_eq!(out.len(), 4 + 3 * 48);
        assert!(out[4..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_encode_line_at_a_time_headers() {
        let bitmap = Bitmap::from_fn(8, 2, |_, y| y == 1);
        assert_eq!(
            encode(&bitmap, true),
            vec![0x12, 0x2A, 1, 1, 0x00, 0x12, 0x2A, 1, 1, 0xFF]
        );
    }

    #[test]
    fn test_from_luma_threshold() {
        let mut img = GrayImage::from_pixel(8, 1, Luma([255]));
        img.put_pixel(0, 0, Luma([0]));
        img.put_pixel(7, 0, Luma([100]));
        let bitmap = Bitmap::from_luma(&img, 128);
        assert_eq!(bitmap.as_bytes(), &[0x81]);
    }

    #[test]
    fn test_from_image_extremes() {
        let black = DynamicImage::ImageLuma8(GrayImage::from_pixel(12, 3, Luma([0])));
        let bitmap = Bitmap::from_image(&black);
        assert_eq!(bitmap.as_bytes(), &[0xFF, 0xF0, 0xFF, 0xF0, 0xFF, 0xF0]);

        let white = DynamicImage::ImageLuma8(GrayImage::from_pixel(12, 3, Luma([255])));
        assert!(Bitmap::from_image(&white).as_bytes().iter().all(|&b| b == 0));
    }
}

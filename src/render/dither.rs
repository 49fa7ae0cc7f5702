//! # Bayer 8x8 Ordered Dithering
//!
//! Converts grayscale intensity into on/off dots. For each pixel the
//! intensity is compared against a threshold taken from the Bayer matrix at
//! `(x mod 8, y mod 8)`:
//!
//! ```text
//! threshold = (BAYER8[y & 7][x & 7] + 0.5) / 64.0
//! ink       = intensity > threshold
//! ```
//!
//! Intensity runs from 0.0 (white paper) to 1.0 (solid black). The half-step
//! offset keeps pure white dot-free and pure black fully inked.

/// Bayer 8x8 dithering matrix (values 0-63, each exactly once)
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Threshold for a pixel position, strictly inside (0, 1).
#[inline]
pub fn threshold(x: usize, y: usize) -> f32 {
    (BAYER8[y & 7][x & 7] as f32 + 0.5) / 64.0
}

/// Whether a dot is printed at `(x, y)` for the given intensity.
///
/// ```
/// use termica::render::dither::should_print;
///
/// assert!(should_print(3, 5, 1.0));
/// assert!(!should_print(3, 5, 0.0));
/// ```
#[inline]
pub fn should_print(x: usize, y: usize, intensity: f32) -> bool {
    intensity > threshold(x, y)
}

/// Intensity of an 8-bit luma sample (0 = black, 255 = white).
#[inline]
pub fn luma_intensity(luma: u8) -> f32 {
    1.0 - luma as f32 / 255.0
}

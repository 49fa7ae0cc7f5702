//! # Rendering
//!
//! Turning continuous-tone images into the 1-bit pixels a thermal head can
//! print.
//!
//! ## Modules
//!
//! - [`dither`]: Bayer 8x8 ordered dithering

pub mod dither;

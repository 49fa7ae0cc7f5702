//! # Thermal Printer Command Protocol
//!
//! Pure byte builders and encoders. Nothing here touches a device or a
//! clock; [`crate::printer::Printer`] sends and paces what these produce.
//!
//! ## Module Structure
//!
//! - [`commands`]: control bytes and every fixed command sequence
//! - [`text`]: print mode flags, character sizes and justification
//! - [`barcode`]: barcode symbology identifiers
//! - [`cp437`]: Unicode to code page 437 text encoding
//! - [`graphics`]: 1-bit bitmaps and the `DC2 *` chunked wire format
//!
//! ## Usage Example
//!
//! ```
//! use termica::protocol::{commands, graphics::{self, Bitmap}, text::Size};
//!
//! let mut data = Vec::new();
//! data.extend(commands::reset());
//! data.extend(commands::char_size(Size::Large.code()));
//! data.extend(b"HELLO\n");
//!
//! // A 16x2 solid block
//! let block = Bitmap::from_fn(16, 2, |_, _| true);
//! data.extend(graphics::encode(&block, false));
//!
//! assert_eq!(&data[..2], &[0x1B, 0x40]);
//! ```

pub mod barcode;
pub mod commands;
pub mod cp437;
pub mod graphics;
pub mod text;

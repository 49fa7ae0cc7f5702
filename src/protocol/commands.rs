//! # Printer Command Table
//!
//! Byte-exact builders for every command the encoder sends. Each builder is a
//! pure function returning the command bytes; pacing and state tracking live
//! in [`crate::printer::Printer`].
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`, `FF`, `HT`
//! - Two bytes: `ESC @`, `DC2 T`
//! - With parameters: `ESC ! n`, `GS ! n LF`, `DC2 * r n`
//!
//! All parameters are single raw bytes. There is no escaping on the wire.

// ============================================================================
// CONTROL BYTES
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
pub const GS: u8 = 0x1D;

/// DC2 (Device Control 2) - Prefix for density, bitmap and test page commands
pub const DC2: u8 = 0x12;

/// DC3 / XOFF. Dropped from formatted text, never sent as a character.
pub const DC3: u8 = 0x13;

/// LF (Line Feed) - Print and advance one line
pub const LF: u8 = 0x0A;

/// FF (Form Feed) - Flush the line buffer
pub const FF: u8 = 0x0C;

/// HT (Horizontal Tab)
pub const HT: u8 = 0x09;

/// First byte of the wake sequence
pub const WAKE: u8 = 0xFF;

// ============================================================================
// INITIALIZATION COMMANDS
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Resets the printer to its power-on defaults: print mode cleared, line
/// spacing restored, line buffer discarded.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ```
/// use termica::protocol::commands;
///
/// assert_eq!(commands::reset(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn reset() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Heating Parameters (ESC 7 n1 n2 n3)
///
/// | Parameter | Meaning |
/// |-----------|---------|
/// | `dots` | Max heating dots, in units of 8 dots |
/// | `time` | Heating time, in units of 10µs |
/// | `interval` | Heating interval, in units of 10µs |
///
/// More heating time gives darker output at the cost of print speed.
#[inline]
pub fn heat_config(dots: u8, time: u8, interval: u8) -> Vec<u8> {
    vec![ESC, b'7', dots, time, interval]
}

/// # Print Density (DC2 # n)
///
/// Packs the break time into bits 5-7 and the density into bits 0-4.
///
/// ```
/// use termica::protocol::commands;
///
/// // density 14, break time 4
/// assert_eq!(commands::print_density(14, 4), vec![0x12, 0x23, 0x8E]);
/// ```
#[inline]
pub fn print_density(density: u8, break_time: u8) -> Vec<u8> {
    vec![DC2, b'#', (break_time << 5) | density]
}

// ============================================================================
// TEXT FORMATTING COMMANDS
// ============================================================================

/// # Select Print Mode (ESC ! n)
///
/// `n` is the full print mode bitmask; every change re-sends all flags.
#[inline]
pub fn print_mode(mask: u8) -> Vec<u8> {
    vec![ESC, b'!', mask]
}

/// # Justification (ESC a n)
///
/// `n = 0` left, `1` center, `2` right.
#[inline]
pub fn justify(n: u8) -> Vec<u8> {
    vec![ESC, b'a', n]
}

/// # Underline (ESC - n)
///
/// `n = 0` off, `1` thin, `2` thick.
#[inline]
pub fn underline(weight: u8) -> Vec<u8> {
    vec![ESC, b'-', weight]
}

/// # Line Height (ESC 3 n)
///
/// Total line height in dots, glyph included.
#[inline]
pub fn line_height(dots: u8) -> Vec<u8> {
    vec![ESC, b'3', dots]
}

/// # Character Size (GS ! n LF)
///
/// The trailing LF is part of the command; the printer advances a line.
///
/// ```
/// use termica::protocol::commands;
///
/// assert_eq!(commands::char_size(0x11), vec![0x1D, 0x21, 0x11, 0x0A]);
/// ```
#[inline]
pub fn char_size(code: u8) -> Vec<u8> {
    vec![GS, b'!', code, LF]
}

/// # International Character Set (ESC R n)
#[inline]
pub fn charset(n: u8) -> Vec<u8> {
    vec![ESC, b'R', n]
}

/// # Character Code Table (ESC t n)
#[inline]
pub fn code_page(n: u8) -> Vec<u8> {
    vec![ESC, b't', n]
}

// ============================================================================
// BARCODE COMMANDS
// ============================================================================

/// # Barcode Height (GS h n)
#[inline]
pub fn barcode_height(dots: u8) -> Vec<u8> {
    vec![GS, b'h', dots]
}

/// # Human Readable Position (GS H 2)
///
/// Prints the payload text below the bars.
#[inline]
pub fn barcode_text_below() -> Vec<u8> {
    vec![GS, b'H', 2]
}

/// # Barcode Module Width (GS w 3)
#[inline]
pub fn barcode_width() -> Vec<u8> {
    vec![GS, b'w', 3]
}

/// # Select Symbology and Print (GS k m)
///
/// The payload follows as plain bytes.
#[inline]
pub fn barcode_start(kind: u8) -> Vec<u8> {
    vec![GS, b'k', kind]
}

// ============================================================================
// GRAPHICS COMMANDS
// ============================================================================

/// # Bitmap Chunk Header (DC2 * r n)
///
/// | Parameter | Meaning |
/// |-----------|---------|
/// | `rows` | Rows in this chunk (1-255) |
/// | `row_bytes` | Bytes per row (1-48) |
///
/// Exactly `rows * row_bytes` data bytes must follow.
///
/// ```
/// use termica::protocol::commands;
///
/// assert_eq!(commands::bitmap_header(2, 2), [0x12, 0x2A, 2, 2]);
/// ```
#[inline]
pub const fn bitmap_header(rows: u8, row_bytes: u8) -> [u8; 4] {
    [DC2, b'*', rows, row_bytes]
}

// ============================================================================
// PAPER AND POWER COMMANDS
// ============================================================================

/// # Feed Dot Rows (ESC J n)
#[inline]
pub fn feed_rows(rows: u8) -> Vec<u8> {
    vec![ESC, b'J', rows]
}

/// # Flush (FF)
#[inline]
pub fn flush() -> Vec<u8> {
    vec![FF]
}

/// # Tab (HT)
#[inline]
pub fn tab() -> Vec<u8> {
    vec![HT]
}

/// # Sleep After (ESC 8 n)
///
/// Puts the printer to sleep `seconds` after the last command.
#[inline]
pub fn sleep_after(seconds: u8) -> Vec<u8> {
    vec![ESC, b'8', seconds]
}

/// # Select Peripheral (ESC = n)
///
/// `online = false` makes the printer ignore everything until it is brought
/// back online.
#[inline]
pub fn set_online(online: bool) -> Vec<u8> {
    vec![ESC, b'=', online as u8]
}

/// # Self Test Page (DC2 T)
#[inline]
pub fn test_page() -> Vec<u8> {
    vec![DC2, b'T']
}

// ============================================================================
// STATUS COMMANDS
// ============================================================================

/// # Transmit Paper Sensor Status (ESC v 0)
///
/// The printer answers with one byte; bit 2 set means paper is out.
#[inline]
pub fn paper_status() -> Vec<u8> {
    vec![ESC, b'v', 0]
}

/// Paper-out bit in the status byte returned for [`paper_status`]
pub const PAPER_OUT_MASK: u8 = 0b0000_0100;

// ============================================================================
// TESTS
// ============================================================================

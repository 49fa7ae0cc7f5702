//! # Printer Session
//!
//! [`Printer`] owns the byte channel, the throttle and all formatting state
//! for one connected printer. Every command goes through one of two paths:
//!
//! - [`Printer::emit_raw`]: command bytes, timed as pure transmission
//!   (`len * byte_time`).
//! - [`Printer::write`]: text, one byte at a time, with column tracking and
//!   line-feed timing.
//!
//! ## Line Timing
//!
//! A line feed costs very different amounts of time depending on what came
//! before it:
//!
//! ```text
//! text line   char_height * dot_print_time + line_spacing * dot_feed_time
//! blank line  (char_height + line_spacing) * dot_feed_time
//! ```
//!
//! A line feed is blank when the previous byte was also a line feed. Hitting
//! the wrap column counts as a line feed of its own.
//!
//! ## Example
//!
//! ```
//! use termica::printer::{Printer, PrinterConfig, throttle::VirtualClock};
//! use termica::protocol::text::Size;
//! use termica::transport::MemoryChannel;
//!
//! let mut printer = Printer::connect(
//!     MemoryChannel::new(),
//!     VirtualClock::new(),
//!     PrinterConfig::default(),
//! )?;
//!
//! printer.set_size(Size::Large)?;
//! printer.bold_on()?;
//! printer.println("RECEIPT")?;
//! printer.bold_off()?;
//! printer.feed(2)?;
//! # Ok::<(), termica::TermicaError>(())
//! ```

use std::fmt;
use std::time::Duration;

use tracing::{debug, trace};

use super::config::PrinterConfig;
use super::throttle::{Clock, SystemClock, Throttle};
use crate::error::TermicaError;
use crate::protocol::barcode::BarcodeType;
use crate::protocol::commands::{self, DC3, ESC, LF, PAPER_OUT_MASK, WAKE};
use crate::protocol::cp437;
use crate::protocol::graphics::{self, BitmapLayout, BitmapSource};
use crate::protocol::text::{Justify, PrintMode, Size, derive_geometry};
use crate::transport::ByteChannel;

/// ESC bytes sent after the initial 0xFF when waking the printer
const WAKE_ESC_COUNT: usize = 11;

/// Pause after each wake byte (seconds)
const WAKE_STEP: f64 = 0.1;

/// Rows added to the barcode height for the human readable text below it
const BARCODE_TEXT_ROWS: f64 = 40.0;

/// Lines fed after a barcode
const BARCODE_TRAILING_FEED: u32 = 2;

/// Minimum line height, one normal glyph
const MIN_LINE_HEIGHT: u8 = 24;

const DEFAULT_LINE_HEIGHT: u8 = 32;
const DEFAULT_BARCODE_HEIGHT: u8 = 50;

/// # Printer Session
///
/// Generic over the channel and the clock so the same encoder drives a
/// serial port in production and a [`crate::transport::MemoryChannel`] with a
/// [`crate::printer::throttle::VirtualClock`] in tests.
///
/// All commands take `&mut self`: one session, one caller at a time.
pub struct Printer<T: ByteChannel, K: Clock = SystemClock> {
    channel: T,
    throttle: Throttle<K>,
    config: PrinterConfig,

    byte_time: f64,
    dot_print_time: f64,
    dot_feed_time: f64,

    prev_byte: u8,
    column: u8,
    max_column: u8,
    char_height: u8,
    line_spacing: u8,
    barcode_height: u8,
    print_mode: PrintMode,
}

impl<T: ByteChannel> Printer<T, SystemClock> {
    /// Connect on the wall clock and run the initialization sequence.
    pub fn open(channel: T, config: PrinterConfig) -> Result<Self, TermicaError> {
        Self::connect(channel, SystemClock, config)
    }
}

impl<T: ByteChannel, K: Clock> Printer<T, K> {
    /// Build a session without sending anything.
    ///
    /// State starts at the configured post-reset defaults. Call
    /// [`Printer::begin`] before printing on a freshly powered printer.
    pub fn new(channel: T, clock: K, config: PrinterConfig) -> Self {
        let mut printer = Self {
            channel,
            throttle: Throttle::new(clock),
            byte_time: config.byte_time(),
            dot_print_time: config.dot_print_time,
            dot_feed_time: config.dot_feed_time,
            prev_byte: LF,
            column: 0,
            max_column: config.max_column,
            char_height: config.char_height,
            line_spacing: config.line_spacing,
            barcode_height: config.barcode_height,
            print_mode: PrintMode::empty(),
            config,
        };
        printer.restore_defaults();
        printer
    }

    /// Validate `config`, build the session and run [`Printer::begin`].
    pub fn connect(channel: T, clock: K, config: PrinterConfig) -> Result<Self, TermicaError> {
        config.validate()?;
        let mut printer = Self::new(channel, clock, config);
        printer.begin()?;
        Ok(printer)
    }

    /// # Initialization Sequence
    ///
    /// 1. Wake: `0xFF`, then eleven `ESC` with 0.1s between them
    /// 2. Reset: `ESC @`
    /// 3. Heating: `ESC 7 dots time interval`
    /// 4. Density: `DC2 # (break_time << 5 | density)`
    pub fn begin(&mut self) -> Result<(), TermicaError> {
        debug!(
            baud = self.config.baud_rate,
            byte_time = self.byte_time,
            "initializing printer"
        );
        self.wake()?;
        self.reset()?;

        let PrinterConfig {
            heat_dots,
            heat_time,
            heat_interval,
            density,
            break_time,
            ..
        } = self.config;
        self.set_heat_config(heat_dots, heat_time, heat_interval)?;
        self.set_print_density(density, break_time)
    }

    // ========================================================================
    // EMISSION PRIMITIVES
    // ========================================================================

    /// Send command bytes as one unit.
    ///
    /// Waits for the current deadline, sends, then sets the deadline to
    /// `bytes.len() * byte_time`. Column and line state are untouched.
    pub fn emit_raw(&mut self, bytes: &[u8]) -> Result<(), TermicaError> {
        self.throttle.wait();
        self.channel.send(bytes)?;
        self.throttle.set_deadline(bytes.len() as f64 * self.byte_time);
        trace!(len = bytes.len(), "emit");
        Ok(())
    }

    /// # Paced Text Write
    ///
    /// Sends `bytes` one at a time, tracking the column and charging each
    /// line feed (explicit or from wrapping at `max_column`) as a text or
    /// blank line. `0x13` bytes are dropped.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), TermicaError> {
        for &byte in bytes {
            if byte == DC3 {
                continue;
            }

            self.throttle.wait();
            self.channel.send(&[byte])?;

            let mut c = byte;
            let mut delay = self.byte_time;
            if c == LF || self.column >= self.max_column {
                if self.prev_byte == LF {
                    delay += (self.char_height as f64 + self.line_spacing as f64)
                        * self.dot_feed_time;
                } else {
                    delay += self.char_height as f64 * self.dot_print_time
                        + self.line_spacing as f64 * self.dot_feed_time;
                    self.column = 0;
                    c = LF;
                }
            } else {
                self.column += 1;
            }

            self.throttle.set_deadline(delay);
            self.prev_byte = c;
        }
        Ok(())
    }

    /// Encode `text` as CP437 and write it.
    pub fn print_str(&mut self, text: &str) -> Result<(), TermicaError> {
        self.write(&cp437::encode(text))
    }

    /// [`Printer::print_str`] followed by a line feed.
    pub fn println(&mut self, text: &str) -> Result<(), TermicaError> {
        self.print_str(text)?;
        self.write(&[LF])
    }

    // ========================================================================
    // PRINT MODE
    // ========================================================================

    /// Turn on the flags in `mask` and re-send the mode byte.
    pub fn set_mode(&mut self, mask: PrintMode) -> Result<(), TermicaError> {
        self.print_mode.insert(mask);
        self.write_print_mode()
    }

    /// Turn off the flags in `mask` and re-send the mode byte.
    pub fn clear_mode(&mut self, mask: PrintMode) -> Result<(), TermicaError> {
        self.print_mode.remove(mask);
        self.write_print_mode()
    }

    /// Clear every print mode flag.
    pub fn normal(&mut self) -> Result<(), TermicaError> {
        self.print_mode = PrintMode::empty();
        self.write_print_mode()
    }

    fn write_print_mode(&mut self) -> Result<(), TermicaError> {
        self.emit_raw(&commands::print_mode(self.print_mode.bits()))?;
        (self.char_height, self.max_column) = derive_geometry(self.print_mode);
        Ok(())
    }

    pub fn inverse_on(&mut self) -> Result<(), TermicaError> {
        self.set_mode(PrintMode::INVERSE)
    }

    pub fn inverse_off(&mut self) -> Result<(), TermicaError> {
        self.clear_mode(PrintMode::INVERSE)
    }

    pub fn upside_down_on(&mut self) -> Result<(), TermicaError> {
        self.set_mode(PrintMode::UPSIDE_DOWN)
    }

    pub fn upside_down_off(&mut self) -> Result<(), TermicaError> {
        self.clear_mode(PrintMode::UPSIDE_DOWN)
    }

    pub fn bold_on(&mut self) -> Result<(), TermicaError> {
        self.set_mode(PrintMode::BOLD)
    }

    pub fn bold_off(&mut self) -> Result<(), TermicaError> {
        self.clear_mode(PrintMode::BOLD)
    }

    pub fn double_height_on(&mut self) -> Result<(), TermicaError> {
        self.set_mode(PrintMode::DOUBLE_HEIGHT)
    }

    pub fn double_height_off(&mut self) -> Result<(), TermicaError> {
        self.clear_mode(PrintMode::DOUBLE_HEIGHT)
    }

    pub fn double_width_on(&mut self) -> Result<(), TermicaError> {
        self.set_mode(PrintMode::DOUBLE_WIDTH)
    }

    pub fn double_width_off(&mut self) -> Result<(), TermicaError> {
        self.clear_mode(PrintMode::DOUBLE_WIDTH)
    }

    pub fn strike_on(&mut self) -> Result<(), TermicaError> {
        self.set_mode(PrintMode::STRIKE)
    }

    pub fn strike_off(&mut self) -> Result<(), TermicaError> {
        self.clear_mode(PrintMode::STRIKE)
    }

    // ========================================================================
    // LAYOUT
    // ========================================================================

    /// # Select Character Size
    ///
    /// | Size | Code | Height | Columns |
    /// |------|------|--------|---------|
    /// | Large | 0x11 | 48 | 16 |
    /// | Medium | 0x01 | 48 | 32 |
    /// | Small | 0x00 | 24 | 32 |
    ///
    /// The printer feeds a line on this command, so the next line feed
    /// counts as blank.
    pub fn set_size(&mut self, size: Size) -> Result<(), TermicaError> {
        self.emit_raw(&commands::char_size(size.code()))?;
        (self.char_height, self.max_column) = size.geometry();
        self.prev_byte = LF;
        Ok(())
    }

    pub fn justify(&mut self, justify: Justify) -> Result<(), TermicaError> {
        self.emit_raw(&commands::justify(justify as u8))
    }

    /// Underline with `weight` 1 (thin) or 2 (thick).
    pub fn underline_on(&mut self, weight: u8) -> Result<(), TermicaError> {
        if !(1..=2).contains(&weight) {
            return Err(TermicaError::InvalidCommand(format!(
                "Underline weight must be 1 or 2, got {}",
                weight
            )));
        }
        self.emit_raw(&commands::underline(weight))
    }

    pub fn underline_off(&mut self) -> Result<(), TermicaError> {
        self.emit_raw(&commands::underline(0))
    }

    /// Set the full line height in dots (at least one glyph, 24).
    pub fn set_line_height(&mut self, dots: u8) -> Result<(), TermicaError> {
        let dots = dots.max(MIN_LINE_HEIGHT);
        self.line_spacing = dots - MIN_LINE_HEIGHT;
        self.emit_raw(&commands::line_height(dots))
    }

    /// Set the device character set (`ESC R n`, 0-15).
    pub fn set_charset(&mut self, charset: u8) -> Result<(), TermicaError> {
        if charset > 15 {
            return Err(TermicaError::InvalidCommand(format!(
                "Character set must be 0-15, got {}",
                charset
            )));
        }
        self.emit_raw(&commands::charset(charset))
    }

    /// Set the device code page (`ESC t n`, 0-47).
    pub fn set_code_page(&mut self, code_page: u8) -> Result<(), TermicaError> {
        if code_page > 47 {
            return Err(TermicaError::InvalidCommand(format!(
                "Code page must be 0-47, got {}",
                code_page
            )));
        }
        self.emit_raw(&commands::code_page(code_page))
    }

    pub fn tab(&mut self) -> Result<(), TermicaError> {
        self.emit_raw(&commands::tab())
    }

    /// Print whatever is in the line buffer.
    pub fn flush(&mut self) -> Result<(), TermicaError> {
        self.emit_raw(&commands::flush())
    }

    // ========================================================================
    // PAPER FEED
    // ========================================================================

    /// Feed `lines` lines as individual line feeds.
    ///
    /// The printer's own multi-line feed command overshoots, so this goes
    /// through [`Printer::write`] once per line.
    pub fn feed(&mut self, lines: u32) -> Result<(), TermicaError> {
        for _ in 0..lines {
            self.write(&[LF])?;
        }
        Ok(())
    }

    /// Feed `rows` dot rows with a single `ESC J n`.
    pub fn feed_rows(&mut self, rows: u8) -> Result<(), TermicaError> {
        self.emit_raw(&commands::feed_rows(rows))?;
        self.throttle.set_deadline(rows as f64 * self.dot_feed_time);
        Ok(())
    }

    // ========================================================================
    // BARCODES
    // ========================================================================

    /// Set the barcode height in dots (at least 1).
    pub fn set_barcode_height(&mut self, dots: u8) -> Result<(), TermicaError> {
        let dots = dots.max(1);
        self.barcode_height = dots;
        self.emit_raw(&commands::barcode_height(dots))
    }

    /// # Print Barcode
    ///
    /// Sends the three setup commands, then the payload in one unpaced
    /// transmission timed as `(barcode_height + 40)` printed rows, then
    /// feeds two lines.
    pub fn print_barcode(&mut self, text: &[u8], kind: BarcodeType) -> Result<(), TermicaError> {
        debug!(kind = kind.name(), len = text.len(), "printing barcode");
        self.emit_raw(&commands::barcode_text_below())?;
        self.emit_raw(&commands::barcode_width())?;
        self.emit_raw(&commands::barcode_start(kind.id()))?;

        self.throttle.wait();
        self.throttle
            .set_deadline((self.barcode_height as f64 + BARCODE_TEXT_ROWS) * self.dot_print_time);
        self.channel.send(text)?;

        self.prev_byte = LF;
        self.feed(BARCODE_TRAILING_FEED)
    }

    // ========================================================================
    // BITMAPS
    // ========================================================================

    /// # Print Bitmap
    ///
    /// Sends `source` as `DC2 *` chunks of up to 255 rows (one row each in
    /// `line_at_a_time` mode). Rows wider than 384 dots are clipped. Header
    /// and rows go through [`Printer::emit_raw`], which does the pacing.
    pub fn print_bitmap<S>(&mut self, source: &S, line_at_a_time: bool) -> Result<(), TermicaError>
    where
        S: BitmapSource + ?Sized,
    {
        let layout = BitmapLayout::new(source.width(), line_at_a_time);
        debug!(
            width = source.width(),
            height = source.height(),
            row_bytes = layout.row_bytes_clipped,
            line_at_a_time,
            "printing bitmap"
        );

        for (start, rows) in graphics::chunk_rows(source.height(), layout.max_chunk_height) {
            self.emit_raw(&layout.header(rows))?;
            for y in start..start + rows {
                let row = graphics::pack_row(source, y, layout.row_bytes);
                self.emit_raw(&row[..layout.row_bytes_clipped])?;
            }
        }

        self.prev_byte = LF;
        Ok(())
    }

    // ========================================================================
    // DEVICE CONTROL
    // ========================================================================

    /// `ESC @` and back to the configured post-reset state.
    pub fn reset(&mut self) -> Result<(), TermicaError> {
        self.emit_raw(&commands::reset())?;
        self.restore_defaults();
        Ok(())
    }

    fn restore_defaults(&mut self) {
        self.prev_byte = LF;
        self.column = 0;
        self.max_column = self.config.max_column;
        self.char_height = self.config.char_height;
        self.line_spacing = self.config.line_spacing;
        self.barcode_height = self.config.barcode_height;
        self.print_mode = PrintMode::empty();
    }

    /// Put every setting back to its default, without a device reset.
    pub fn set_default(&mut self) -> Result<(), TermicaError> {
        self.online()?;
        self.justify(Justify::Left)?;
        self.inverse_off()?;
        self.double_height_off()?;
        self.set_line_height(DEFAULT_LINE_HEIGHT)?;
        self.bold_off()?;
        self.underline_off()?;
        self.set_barcode_height(DEFAULT_BARCODE_HEIGHT)?;
        self.set_size(Size::Small)
    }

    /// Wake the printer from sleep.
    pub fn wake(&mut self) -> Result<(), TermicaError> {
        self.emit_raw(&[WAKE])?;
        for _ in 0..WAKE_ESC_COUNT {
            self.emit_raw(&[ESC])?;
            self.throttle.set_deadline(WAKE_STEP);
        }
        Ok(())
    }

    /// Sleep `seconds` after the last command.
    pub fn sleep_after(&mut self, seconds: u8) -> Result<(), TermicaError> {
        self.emit_raw(&commands::sleep_after(seconds))
    }

    pub fn sleep(&mut self) -> Result<(), TermicaError> {
        self.sleep_after(1)
    }

    /// Stop accepting print data until [`Printer::online`].
    pub fn offline(&mut self) -> Result<(), TermicaError> {
        self.emit_raw(&commands::set_online(false))
    }

    pub fn online(&mut self) -> Result<(), TermicaError> {
        self.emit_raw(&commands::set_online(true))
    }

    /// Heating parameters, see [`commands::heat_config`].
    pub fn set_heat_config(&mut self, dots: u8, time: u8, interval: u8) -> Result<(), TermicaError> {
        self.emit_raw(&commands::heat_config(dots, time, interval))
    }

    /// Print density (0-31) and break time (0-7).
    pub fn set_print_density(&mut self, density: u8, break_time: u8) -> Result<(), TermicaError> {
        if density > 31 || break_time > 7 {
            return Err(TermicaError::InvalidCommand(format!(
                "Density must be 0-31 and break time 0-7, got {} and {}",
                density, break_time
            )));
        }
        self.emit_raw(&commands::print_density(density, break_time))
    }

    /// Replace the per-dot-row print and feed times.
    pub fn set_times(&mut self, print: Duration, feed: Duration) {
        self.dot_print_time = print.as_secs_f64();
        self.dot_feed_time = feed.as_secs_f64();
    }

    /// Print the built-in self test page.
    pub fn test_page(&mut self) -> Result<(), TermicaError> {
        self.emit_raw(&commands::test_page())?;
        self.throttle.set_deadline(
            self.dot_print_time * 24.0 * 26.0 + self.dot_feed_time * (6.0 * 26.0 + 30.0),
        );
        Ok(())
    }

    /// # Paper Sensor
    ///
    /// `Ok(true)` when paper is present. A printer that sends nothing back
    /// gives [`TermicaError::NoStatus`] rather than a guess.
    pub fn has_paper(&mut self) -> Result<bool, TermicaError> {
        self.emit_raw(&commands::paper_status())?;
        let status = self.channel.receive(1)?;
        match status.first() {
            Some(&byte) => Ok(byte & PAPER_OUT_MASK == 0),
            None => Err(TermicaError::NoStatus),
        }
    }

    // ========================================================================
    // STATE ACCESS
    // ========================================================================

    pub fn column(&self) -> u8 {
        self.column
    }

    pub fn max_column(&self) -> u8 {
        self.max_column
    }

    pub fn prev_byte(&self) -> u8 {
        self.prev_byte
    }

    pub fn char_height(&self) -> u8 {
        self.char_height
    }

    pub fn line_spacing(&self) -> u8 {
        self.line_spacing
    }

    pub fn barcode_height(&self) -> u8 {
        self.barcode_height
    }

    pub fn print_mode(&self) -> PrintMode {
        self.print_mode
    }

    /// Seconds per byte on the wire
    pub fn byte_time(&self) -> f64 {
        self.byte_time
    }

    pub fn dot_print_time(&self) -> f64 {
        self.dot_print_time
    }

    pub fn dot_feed_time(&self) -> f64 {
        self.dot_feed_time
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    pub fn throttle(&self) -> &Throttle<K> {
        &self.throttle
    }

    pub fn throttle_mut(&mut self) -> &mut Throttle<K> {
        &mut self.throttle
    }

    pub fn channel(&self) -> &T {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut T {
        &mut self.channel
    }

    /// End the session and hand back the channel.
    pub fn into_channel(self) -> T {
        self.channel
    }
}

/// `write!` support. Text is CP437 encoded and paced like [`Printer::print_str`].
impl<T: ByteChannel, K: Clock> fmt::Write for Printer<T, K> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print_str(s).map_err(|_| fmt::Error)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::throttle::VirtualClock;
    use crate::transport::MemoryChannel;

    fn printer() -> Printer<MemoryChannel, VirtualClock> {
        Printer::new(MemoryChannel::new(), VirtualClock::new(), PrinterConfig::default())
    }

    fn sent(p: &mut Printer<MemoryChannel, VirtualClock>) -> Vec<u8> {
        p.channel_mut().take_sent()
    }

    fn assert_last_delay(p: &Printer<MemoryChannel, VirtualClock>, seconds: f64) {
        let actual = p.throttle().last_delay().as_secs_f64();
        assert!(
            (actual - seconds).abs() < 1e-8,
            "expected delay {}s, got {}s",
            seconds,
            actual
        );
    }

    #[test]
    fn test_new_sends_nothing() {
        let p = printer();
        assert!(p.channel().sent().is_empty());
        assert_eq!(p.prev_byte(), LF);
        assert_eq!(p.column(), 0);
        assert_eq!(p.max_column(), 32);
        assert_eq!(p.char_height(), 24);
        assert_eq!(p.line_spacing(), 6);
        assert_eq!(p.barcode_height(), 50);
    }

    #[test]
    fn test_begin_sequence() {
        let mut p = printer();
        p.begin().unwrap();

        let mut expected = vec![0xFF];
        expected.extend([0x1B; 11]);
        expected.extend([0x1B, 0x40]);
        expected.extend([0x1B, 0x37, 32, 55, 250]);
        expected.extend([0x12, 0x23, 0x8E]);
        assert_eq!(sent(&mut p), expected);
    }

    #[test]
    fn test_wake_pauses_between_bytes() {
        let mut p = printer();
        p.wake().unwrap();
        // Ten of the eleven 0.1s pauses have been waited out
        let slept = p.throttle().clock().slept().as_secs_f64();
        assert!((slept - 10.0 * WAKE_STEP - p.byte_time()).abs() < 1e-6);
        assert_eq!(p.channel().send_count(), 12);
    }

    #[test]
    fn test_emit_raw_leaves_text_state() {
        let mut p = printer();
        p.write(b"ab").unwrap();
        p.emit_raw(&[0x1B, 0x40, 0x00]).unwrap();
        assert_eq!(p.column(), 2);
        assert_eq!(p.prev_byte(), b'b');
        assert_last_delay(&p, 3.0 * p.byte_time());
    }

    #[test]
    fn test_write_drops_dc3() {
        let mut p = printer();
        p.write(&[b'a', 0x13, b'b']).unwrap();
        assert_eq!(sent(&mut p), b"ab");
        assert_eq!(p.column(), 2);
    }

    #[test]
    fn test_write_sends_one_byte_at_a_time() {
        let mut p = printer();
        p.write(b"hello").unwrap();
        assert_eq!(p.channel().send_count(), 5);
    }

    #[test]
    fn test_text_line_feed_timing() {
        let mut p = printer();
        p.write(b"x").unwrap();
        p.write(&[LF]).unwrap();
        let expected = p.byte_time() + 24.0 * p.dot_print_time() + 6.0 * p.dot_feed_time();
        assert_last_delay(&p, expected);
        assert_eq!(p.column(), 0);
        assert_eq!(p.prev_byte(), LF);
    }

    #[test]
    fn test_wrap_substitutes_line_feed() {
        let mut p = printer();
        p.write(&[b'x'; 32]).unwrap();
        assert_eq!(p.column(), 32);
        p.write(b"y").unwrap();
        assert_eq!(p.column(), 0);
        assert_eq!(p.prev_byte(), LF);
        let expected = p.byte_time() + 24.0 * p.dot_print_time() + 6.0 * p.dot_feed_time();
        assert_last_delay(&p, expected);
        // The wrapped character itself is still sent
        assert_eq!(sent(&mut p).last(), Some(&b'y'));
    }

    #[test]
    fn test_narrower_wrap_after_column_overshoot() {
        let mut p = printer();
        p.write(&[b'x'; 20]).unwrap();
        p.double_width_on().unwrap();
        assert_eq!(p.max_column(), 16);
        p.write(b"z").unwrap();
        assert_eq!(p.column(), 0);
    }

    #[test]
    fn test_mode_toggles() {
        let mut p = printer();
        p.bold_on().unwrap();
        p.double_height_on().unwrap();
        assert_eq!(p.char_height(), 48);
        assert_eq!(p.max_column(), 32);
        p.double_width_on().unwrap();
        assert_eq!(p.max_column(), 16);
        assert_eq!(
            sent(&mut p),
            vec![0x1B, 0x21, 0x08, 0x1B, 0x21, 0x18, 0x1B, 0x21, 0x38]
        );

        p.double_height_off().unwrap();
        p.double_width_off().unwrap();
        assert_eq!((p.char_height(), p.max_column()), (24, 32));
        assert_eq!(p.print_mode(), PrintMode::BOLD);

        p.normal().unwrap();
        assert!(p.print_mode().is_empty());
    }

    #[test]
    fn test_each_named_toggle_uses_its_bit() {
        type Toggle = fn(&mut Printer<MemoryChannel, VirtualClock>) -> Result<(), TermicaError>;
        let cases: [(Toggle, Toggle, PrintMode); 6] = [
            (Printer::inverse_on, Printer::inverse_off, PrintMode::INVERSE),
            (Printer::upside_down_on, Printer::upside_down_off, PrintMode::UPSIDE_DOWN),
            (Printer::bold_on, Printer::bold_off, PrintMode::BOLD),
            (Printer::double_height_on, Printer::double_height_off, PrintMode::DOUBLE_HEIGHT),
            (Printer::double_width_on, Printer::double_width_off, PrintMode::DOUBLE_WIDTH),
            (Printer::strike_on, Printer::strike_off, PrintMode::STRIKE),
        ];
        for (on, off, flag) in cases {
            let mut p = printer();
            on(&mut p).unwrap();
            assert_eq!(p.print_mode(), flag);
            assert_eq!(sent(&mut p), vec![0x1B, 0x21, flag.bits()]);
            off(&mut p).unwrap();
            assert!(p.print_mode().is_empty());
            assert_eq!(sent(&mut p), vec![0x1B, 0x21, 0x00]);
        }
    }

    #[test]
    fn test_set_size_medium_and_small() {
        let mut p = printer();
        p.set_size(Size::Medium).unwrap();
        assert_eq!((p.char_height(), p.max_column()), (48, 32));
        p.set_size(Size::Small).unwrap();
        assert_eq!((p.char_height(), p.max_column()), (24, 32));
        assert_eq!(
            sent(&mut p),
            vec![0x1D, 0x21, 0x01, 0x0A, 0x1D, 0x21, 0x00, 0x0A]
        );
    }

    #[test]
    fn test_justify_and_underline() {
        let mut p = printer();
        p.justify(Justify::Center).unwrap();
        p.underline_on(2).unwrap();
        p.underline_off().unwrap();
        assert_eq!(
            sent(&mut p),
            vec![0x1B, 0x61, 1, 0x1B, 0x2D, 2, 0x1B, 0x2D, 0]
        );
    }

    #[test]
    fn test_underline_weight_rejected_before_sending() {
        let mut p = printer();
        assert!(matches!(
            p.underline_on(3),
            Err(TermicaError::InvalidCommand(_))
        ));
        assert!(p.underline_on(0).is_err());
        assert!(p.channel().sent().is_empty());
    }

    #[test]
    fn test_line_height_clamps_and_sets_spacing() {
        let mut p = printer();
        p.set_line_height(40).unwrap();
        assert_eq!(p.line_spacing(), 16);
        p.set_line_height(10).unwrap();
        assert_eq!(p.line_spacing(), 0);
        assert_eq!(sent(&mut p), vec![0x1B, 0x33, 40, 0x1B, 0x33, 24]);
    }

    #[test]
    fn test_barcode_height_clamps() {
        let mut p = printer();
        p.set_barcode_height(0).unwrap();
        assert_eq!(p.barcode_height(), 1);
        assert_eq!(sent(&mut p), vec![0x1D, 0x68, 1]);
    }

    #[test]
    fn test_print_barcode() {
        let mut p = printer();
        p.write(b"x").unwrap();
        sent(&mut p);

        p.print_barcode(b"ABC123", BarcodeType::Code39).unwrap();
        let mut expected = vec![0x1D, 0x48, 0x02, 0x1D, 0x77, 0x03, 0x1D, 0x6B, 0x04];
        expected.extend(b"ABC123");
        expected.extend([LF, LF]);
        assert_eq!(sent(&mut p), expected);
        assert_eq!(p.prev_byte(), LF);
    }

    #[test]
    fn test_barcode_payload_is_one_send() {
        let mut p = printer();
        p.print_barcode(b"0123456789", BarcodeType::Code128).unwrap();
        // 3 setup commands + payload + 2 feeds
        assert_eq!(p.channel().send_count(), 6);
    }

    #[test]
    fn test_barcode_feeds_are_blank_lines() {
        let mut p = printer();
        p.print_barcode(b"1", BarcodeType::UpcA).unwrap();
        let expected = p.byte_time() + (24.0 + 6.0) * p.dot_feed_time();
        assert_last_delay(&p, expected);
    }

    #[test]
    fn test_barcode_payload_timing() {
        let mut p = printer();
        p.print_barcode(b"1", BarcodeType::Code128).unwrap();
        // The first trailing feed waits out (50 + 40) printed rows
        let slept = p.throttle().clock().slept().as_secs_f64();
        assert!(slept >= 90.0 * 0.033);
        assert!(slept < 90.0 * 0.033 + 0.2);
    }

    #[test]
    fn test_feed_rows() {
        let mut p = printer();
        p.feed_rows(100).unwrap();
        assert_eq!(sent(&mut p), vec![0x1B, 0x4A, 100]);
        assert_last_delay(&p, 100.0 * 0.0025);
    }

    #[test]
    fn test_feed_zero_is_noop() {
        let mut p = printer();
        p.feed(0).unwrap();
        assert!(p.channel().sent().is_empty());
    }

    #[test]
    fn test_simple_commands() {
        let mut p = printer();
        p.tab().unwrap();
        p.flush().unwrap();
        p.sleep().unwrap();
        p.offline().unwrap();
        p.online().unwrap();
        p.set_charset(3).unwrap();
        p.set_code_page(16).unwrap();
        assert_eq!(
            sent(&mut p),
            vec![
                0x09, 0x0C, 0x1B, 0x38, 1, 0x1B, 0x3D, 0, 0x1B, 0x3D, 1, 0x1B, 0x52, 3, 0x1B,
                0x74, 16
            ]
        );
    }

    #[test]
    fn test_charset_and_code_page_ranges() {
        let mut p = printer();
        assert!(p.set_charset(16).is_err());
        assert!(p.set_code_page(48).is_err());
        assert!(p.set_print_density(32, 0).is_err());
        assert!(p.set_print_density(0, 8).is_err());
        assert!(p.channel().sent().is_empty());
    }

    #[test]
    fn test_reset_restores_state() {
        let mut p = printer();
        p.write(b"abc").unwrap();
        p.double_width_on().unwrap();
        p.set_line_height(50).unwrap();
        p.set_barcode_height(100).unwrap();
        sent(&mut p);

        p.reset().unwrap();
        assert_eq!(sent(&mut p), vec![0x1B, 0x40]);
        assert_eq!(p.column(), 0);
        assert_eq!(p.prev_byte(), LF);
        assert_eq!(p.max_column(), 32);
        assert_eq!(p.line_spacing(), 6);
        assert_eq!(p.barcode_height(), 50);
        assert!(p.print_mode().is_empty());
    }

    #[test]
    fn test_set_default_sequence() {
        let mut p = printer();
        p.set_default().unwrap();
        assert_eq!(
            sent(&mut p),
            vec![
                0x1B, 0x3D, 1, // online
                0x1B, 0x61, 0, // justify left
                0x1B, 0x21, 0, // inverse off
                0x1B, 0x21, 0, // double height off
                0x1B, 0x33, 32, // line height
                0x1B, 0x21, 0, // bold off
                0x1B, 0x2D, 0, // underline off
                0x1D, 0x68, 50, // barcode height
                0x1D, 0x21, 0x00, 0x0A, // size S
            ]
        );
        assert_eq!(p.line_spacing(), 8);
    }

    #[test]
    fn test_test_page_timing() {
        let mut p = printer();
        p.test_page().unwrap();
        assert_eq!(sent(&mut p), vec![0x12, 0x54]);
        assert_last_delay(&p, 0.033 * 24.0 * 26.0 + 0.0025 * (6.0 * 26.0 + 30.0));
    }

    #[test]
    fn test_set_times() {
        let mut p = printer();
        p.set_times(Duration::from_micros(30_000), Duration::from_micros(2_100));
        assert!((p.dot_print_time() - 0.03).abs() < 1e-12);
        assert!((p.dot_feed_time() - 0.0021).abs() < 1e-12);
    }

    #[test]
    fn test_has_paper() {
        let mut p = printer();
        p.channel_mut().queue_response(&[0x00]);
        assert!(p.has_paper().unwrap());
        assert_eq!(sent(&mut p), vec![0x1B, 0x76, 0x00]);

        p.channel_mut().queue_response(&[0x04]);
        assert!(!p.has_paper().unwrap());

        // Other status bits don't matter
        p.channel_mut().queue_response(&[0xFB]);
        assert!(p.has_paper().unwrap());
    }

    #[test]
    fn test_has_paper_without_response() {
        let mut p = printer();
        assert!(matches!(p.has_paper(), Err(TermicaError::NoStatus)));
    }

    #[test]
    fn test_print_str_and_println() {
        let mut p = printer();
        p.println("Año").unwrap();
        assert_eq!(sent(&mut p), vec![b'A', 0xA4, b'o', LF]);
        assert_eq!(p.column(), 0);
    }

    #[test]
    fn test_fmt_write() {
        use std::fmt::Write;

        let mut p = printer();
        write!(p, "Total: {}", 42).unwrap();
        assert_eq!(sent(&mut p), b"Total: 42");
        assert_eq!(p.column(), 9);
    }

    #[test]
    fn test_connect_rejects_bad_config() {
        let config = PrinterConfig {
            baud_rate: 0,
            ..PrinterConfig::default()
        };
        let result = Printer::connect(MemoryChannel::new(), VirtualClock::new(), config);
        assert!(matches!(result, Err(TermicaError::Config(_))));
    }

    #[test]
    fn test_into_channel() {
        let mut p = printer();
        p.write(b"z").unwrap();
        assert_eq!(p.into_channel().sent(), b"z");
    }
}

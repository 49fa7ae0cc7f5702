//! # Termica - Serial Thermal Printer Encoder
//!
//! Termica drives small thermal receipt printers over a serial line that has
//! no flow control. It provides:
//!
//! - **Paced output**: every command is followed by an estimate of how long
//!   the mechanism needs, and the next command waits for it
//! - **Text formatting**: print modes, sizes, justification, line spacing
//! - **Barcodes and bitmaps**: symbology selection and `DC2 *` raster chunks
//! - **Transport**: raw TTY serial ports, plus an in-memory channel
//!
//! ## Quick Start
//!
//! ```no_run
//! use termica::{Printer, PrinterConfig, SerialTransport};
//! use termica::protocol::{barcode::BarcodeType, text::Justify};
//!
//! let config = PrinterConfig::default();
//! let transport = SerialTransport::open(&config.device, config.baud_rate)?;
//! let mut printer = Printer::open(transport, config)?;
//!
//! printer.justify(Justify::Center)?;
//! printer.println("Hello, paper")?;
//! printer.print_barcode(b"123456789012", BarcodeType::UpcA)?;
//! printer.feed(3)?;
//!
//! # Ok::<(), termica::TermicaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Command builders and encoders |
//! | [`printer`] | The paced printer session and its settings |
//! | [`render`] | Dithering |
//! | [`transport`] | Byte channels |
//! | [`error`] | Error types |

pub mod error;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod transport;

// Re-exports for convenience
pub use error::TermicaError;
pub use printer::{Printer, PrinterConfig};
pub use transport::{MemoryChannel, SerialTransport};

//! # Termica CLI
//!
//! Command-line interface for serial thermal printers.
//!
//! ## Usage
//!
//! ```bash
//! # Print a line of text, centered and bold
//! termica text --justify C --bold "Hello, paper"
//!
//! # Print text from stdin in large type
//! echo "BIG" | termica text --size L
//!
//! # Print an image (dithered, scaled down to 384 dots)
//! termica image photo.png
//!
//! # Print a barcode
//! termica barcode --kind CODE128 "TERMICA-42"
//!
//! # Check the paper sensor
//! termica status
//!
//! # Capture the bytes instead of sending them
//! termica --output job.bin text "dry run"
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use image::imageops::FilterType;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use termica::{
    MemoryChannel, Printer, PrinterConfig, SerialTransport, TermicaError,
    printer::throttle::{Clock, VirtualClock},
    protocol::{
        barcode::BarcodeType,
        graphics::{Bitmap, MAX_WIDTH_DOTS},
        text::{Justify, Size},
    },
    transport::ByteChannel,
};

/// Termica - Serial thermal printer utility
#[derive(Parser, Debug)]
#[command(name = "termica")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON printer configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial device path (overrides the config file)
    #[arg(long, global = true)]
    device: Option<String>,

    /// Baud rate (overrides the config file)
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// Write the bytes to FILE instead of a printer
    #[arg(long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print text (arguments, or stdin when none are given)
    Text {
        /// Text to print, one line per argument
        text: Vec<String>,

        /// Character size: S, M or L
        #[arg(long, default_value = "S")]
        size: Size,

        /// Justification: L, C or R
        #[arg(long, default_value = "L")]
        justify: Justify,

        #[arg(long)]
        bold: bool,

        #[arg(long)]
        inverse: bool,

        #[arg(long)]
        upside_down: bool,

        /// Underline weight, 1 or 2
        #[arg(long, value_name = "WEIGHT")]
        underline: Option<u8>,

        /// Lines to feed afterwards
        #[arg(long, default_value = "3")]
        feed: u32,
    },

    /// Print an image file
    Image {
        path: PathBuf,

        /// Use a fixed threshold instead of dithering
        #[arg(long)]
        threshold: Option<u8>,

        /// Send one row per chunk
        #[arg(long)]
        line_at_a_time: bool,

        /// Lines to feed afterwards
        #[arg(long, default_value = "3")]
        feed: u32,
    },

    /// Print a barcode
    Barcode {
        data: String,

        /// Symbology name or numeric id
        #[arg(long, default_value = "CODE128")]
        kind: BarcodeType,

        /// Barcode height in dots
        #[arg(long)]
        height: Option<u8>,

        /// Lines to feed afterwards
        #[arg(long, default_value = "2")]
        feed: u32,
    },

    /// Feed paper
    Feed {
        /// Lines to feed
        #[arg(default_value = "1")]
        lines: u32,

        /// Feed dot rows with one command instead of lines
        #[arg(long)]
        rows: Option<u8>,
    },

    /// Query the paper sensor
    Status,

    /// Print the built-in self test page
    TestPage,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), TermicaError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    debug!(device = %config.device, baud = config.baud_rate, "loaded config");

    match &cli.output {
        Some(path) => dry_run(path, config, &cli.command),
        None => {
            let transport = SerialTransport::open(&config.device, config.baud_rate)?;
            let mut printer = Printer::open(transport, config)?;
            execute(&mut printer, &cli.command)?;
            // Let the last command finish before the port closes
            printer.throttle_mut().wait();
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Config file (or defaults), then command line overrides.
fn load_config(cli: &Cli) -> Result<PrinterConfig, TermicaError> {
    let mut config = match &cli.config {
        Some(path) => PrinterConfig::from_json_file(path)?,
        None => PrinterConfig::default(),
    };
    if let Some(device) = &cli.device {
        config.device = device.clone();
    }
    if let Some(baud) = cli.baud {
        config.baud_rate = baud;
    }
    config.validate()?;
    Ok(config)
}

/// Run `command` against an in-memory channel on a virtual clock and save
/// the captured bytes.
fn dry_run(path: &Path, config: PrinterConfig, command: &Commands) -> Result<(), TermicaError> {
    let mut printer = Printer::connect(MemoryChannel::new(), VirtualClock::new(), config)?;
    execute(&mut printer, command)?;
    printer.throttle_mut().wait();

    let elapsed = printer.throttle().clock().elapsed();
    let channel = printer.into_channel();
    fs::write(path, channel.sent())?;

    println!(
        "Wrote {} bytes to {} (about {:.1}s at the printer)",
        channel.sent().len(),
        path.display(),
        elapsed.as_secs_f64()
    );
    Ok(())
}

fn execute<T: ByteChannel, K: Clock>(
    printer: &mut Printer<T, K>,
    command: &Commands,
) -> Result<(), TermicaError> {
    match command {
        Commands::Text {
            text,
            size,
            justify,
            bold,
            inverse,
            upside_down,
            underline,
            feed,
        } => {
            let text = if text.is_empty() {
                let mut input = String::new();
                io::stdin().read_to_string(&mut input)?;
                input
            } else {
                text.join("\n")
            };

            printer.set_size(*size)?;
            printer.justify(*justify)?;
            if *bold {
                printer.bold_on()?;
            }
            if *inverse {
                printer.inverse_on()?;
            }
            if *upside_down {
                printer.upside_down_on()?;
            }
            if let Some(weight) = underline {
                printer.underline_on(*weight)?;
            }

            for line in text.lines() {
                printer.println(line)?;
            }

            printer.set_default()?;
            printer.feed(*feed)?;
        }

        Commands::Image {
            path,
            threshold,
            line_at_a_time,
            feed,
        } => {
            let bitmap = load_bitmap(path, *threshold)?;
            printer.print_bitmap(&bitmap, *line_at_a_time)?;
            printer.feed(*feed)?;
        }

        Commands::Barcode {
            data,
            kind,
            height,
            feed,
        } => {
            if let Some(height) = height {
                printer.set_barcode_height(*height)?;
            }
            printer.print_barcode(data.as_bytes(), *kind)?;
            printer.feed(*feed)?;
        }

        Commands::Feed { lines, rows } => match rows {
            Some(rows) => printer.feed_rows(*rows)?,
            None => printer.feed(*lines)?,
        },

        Commands::Status => {
            let present = printer.has_paper()?;
            println!("Paper: {}", if present { "present" } else { "out" });
        }

        Commands::TestPage => printer.test_page()?,
    }
    Ok(())
}

/// Decode an image file, scale it to the print width and convert it to 1-bit.
fn load_bitmap(path: &Path, threshold: Option<u8>) -> Result<Bitmap, TermicaError> {
    let img = image::open(path).map_err(|e| {
        TermicaError::Image(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let max_width = MAX_WIDTH_DOTS as u32;
    let img = if img.width() > max_width {
        img.resize(max_width, img.height(), FilterType::Triangle)
    } else {
        img
    };
    debug!(width = img.width(), height = img.height(), "decoded image");

    Ok(match threshold {
        Some(threshold) => Bitmap::from_luma(&img.to_luma8(), threshold),
        None => Bitmap::from_image(&img),
    })
}

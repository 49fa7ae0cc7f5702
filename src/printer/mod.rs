//! # Printer Session and Settings
//!
//! ## Modules
//!
//! - [`config`]: link speed, timing coefficients and power-on settings
//! - [`throttle`]: deadline tracking and the clocks behind it
//! - [`session`]: the [`Printer`] encoder itself

pub mod config;
pub mod session;
pub mod throttle;

pub use config::PrinterConfig;
pub use session::Printer;

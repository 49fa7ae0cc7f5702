//! # Printer Configuration
//!
//! Link speed, timing coefficients and power-on settings for one printer.
//!
//! ## Timing Model
//!
//! | Field | Meaning | Default |
//! |-------|---------|---------|
//! | `baud_rate` | Serial speed | 19200 |
//! | `dot_print_time` | Seconds per printed dot row | 0.033 |
//! | `dot_feed_time` | Seconds per blank dot row | 0.0025 |
//!
//! One byte on the wire takes `11 / baud_rate` seconds (start, 8 data, stop
//! and an idle bit).
//!
//! ## File Format
//!
//! Every field is optional; missing fields take their defaults.
//!
//! ```json
//! {
//!   "device": "/dev/ttyUSB0",
//!   "baud_rate": 9600,
//!   "dot_print_time": 0.03
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TermicaError;

/// Default serial device path
pub const DEFAULT_DEVICE: &str = "/dev/serial0";

/// # Printer Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Serial device path
    pub device: String,

    /// Serial link speed in baud
    pub baud_rate: u32,

    /// Seconds to print one dot row
    pub dot_print_time: f64,

    /// Seconds to feed one blank dot row
    pub dot_feed_time: f64,

    /// Max heating dots (units of 8 dots)
    pub heat_dots: u8,

    /// Heating time (units of 10µs)
    pub heat_time: u8,

    /// Heating interval (units of 10µs)
    pub heat_interval: u8,

    /// Print density, 0-31
    pub density: u8,

    /// Print break time, 0-7
    pub break_time: u8,

    /// Glyph height after reset (dots)
    pub char_height: u8,

    /// Space between lines after reset (dots)
    pub line_spacing: u8,

    /// Wrap column after reset
    pub max_column: u8,

    /// Barcode height after reset (dots)
    pub barcode_height: u8,
}

impl PrinterConfig {
    /// Defaults for the common 58mm serial thermal mechanism.
    pub const DEFAULT: Self = Self {
        device: String::new(),
        baud_rate: 19200,
        dot_print_time: 0.033,
        dot_feed_time: 0.0025,
        heat_dots: 32,
        heat_time: 55,
        heat_interval: 250,
        density: 14,
        break_time: 4,
        char_height: 24,
        line_spacing: 6,
        max_column: 32,
        barcode_height: 50,
    };

    /// Read a JSON configuration file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TermicaError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            TermicaError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Parse a JSON configuration string and validate it.
    pub fn from_json(text: &str) -> Result<Self, TermicaError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| TermicaError::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is in a range the printer accepts.
    pub fn validate(&self) -> Result<(), TermicaError> {
        if self.baud_rate == 0 {
            return Err(TermicaError::Config("baud_rate must be positive".into()));
        }
        for (name, value) in [
            ("dot_print_time", self.dot_print_time),
            ("dot_feed_time", self.dot_feed_time),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TermicaError::Config(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, value
                )));
            }
        }
        if self.density > 31 {
            return Err(TermicaError::Config(format!(
                "density must be 0-31, got {}",
                self.density
            )));
        }
        if self.break_time > 7 {
            return Err(TermicaError::Config(format!(
                "break_time must be 0-7, got {}",
                self.break_time
            )));
        }
        if self.max_column == 0 {
            return Err(TermicaError::Config("max_column must be positive".into()));
        }
        Ok(())
    }

    /// Seconds to transmit one byte
    ///
    /// ```
    /// use termica::printer::PrinterConfig;
    ///
    /// let config = PrinterConfig::default();
    /// assert!((config.byte_time() - 11.0 / 19200.0).abs() < 1e-12);
    /// ```
    #[inline]
    pub fn byte_time(&self) -> f64 {
        11.0 / self.baud_rate as f64
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            ..Self::DEFAULT
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PrinterConfig::default();
        assert_eq!(config.device, "/dev/serial0");
        assert_eq!(config.baud_rate, 19200);
        assert_eq!(config.density, 14);
        assert_eq!(config.break_time, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            PrinterConfig::from_json(r#"{ "baud_rate": 9600, "device": "/dev/ttyUSB0" }"#).unwrap();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.device, "/dev/ttyUSB0");
        assert_eq!(config.dot_print_time, 0.033);
        assert_eq!(config.heat_interval, 250);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(PrinterConfig::from_json("{}").unwrap(), PrinterConfig::default());
    }

    #[test]
    fn test_rejects_zero_baud() {
        assert!(matches!(
            PrinterConfig::from_json(r#"{ "baud_rate": 0 }"#),
            Err(TermicaError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_density() {
        assert!(PrinterConfig::from_json(r#"{ "density": 32 }"#).is_err());
        assert!(PrinterConfig::from_json(r#"{ "break_time": 8 }"#).is_err());
    }

    #[test]
    fn test_rejects_negative_timing() {
        assert!(PrinterConfig::from_json(r#"{ "dot_feed_time": -0.1 }"#).is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            PrinterConfig::from_json("{ baud_rate: "),
            Err(TermicaError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PrinterConfig::from_json_file("/nonexistent/termica.json"),
            Err(TermicaError::Config(_))
        ));
    }

    #[test]
    fn test_byte_time() {
        let config = PrinterConfig {
            baud_rate: 9600,
            ..PrinterConfig::default()
        };
        assert_eq!(config.byte_time(), 11.0 / 9600.0);
    }
}

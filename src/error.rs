//! # Error Types
//!
//! This module defines error types used throughout the termica library.

use thiserror::Error;

/// Main error type for termica operations
#[derive(Debug, Error)]
pub enum TermicaError {
    /// Transport-level errors (open, write, read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid command or parameter, detected before anything is sent
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// The printer did not answer a status query
    #[error("No status response from printer")]
    NoStatus,

    /// Configuration file could not be read or is out of range
    #[error("Config error: {0}")]
    Config(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

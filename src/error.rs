//! Error types for the instrument client
//!
//! Provides a unified error type for all operations.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using SdiError
pub type Result<T> = std::result::Result<T, SdiError>;

/// Unified error type for instrument client operations
#[derive(Debug, Error)]
pub enum SdiError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("Timed out after {0:?} waiting for the instrument")]
    Timeout(Duration),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Notification consumer disconnected")]
    ConsumerDisconnected,
}

impl SdiError {
    /// Classify an I/O error raised by a read
    ///
    /// `WouldBlock` (Unix) and `TimedOut` (Windows, serial ports) both mean the
    /// configured read timeout elapsed.
    pub fn from_read(err: io::Error, timeout: Option<Duration>) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                SdiError::Timeout(timeout.unwrap_or_default())
            }
            _ => SdiError::Io(err),
        }
    }

    /// Error for a channel that closed while a read was in progress
    pub fn closed(what: &str) -> Self {
        SdiError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("channel closed while waiting for {}", what),
        ))
    }

    /// Whether this error is a read timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, SdiError::Timeout(_))
    }
}

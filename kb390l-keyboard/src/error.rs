//! Keyboard session error types

use kb390l_transport::TransportError;
use thiserror::Error;

/// Errors from keyboard operations
#[derive(Error, Debug)]
pub enum KeyboardError {
    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Fewer bytes moved than the exchange requires
    #[error("{what}: expected {expected} bytes, got {actual}")]
    ShortTransfer {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Device echoed the wrong command, index or length
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Value outside the range the firmware accepts
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Control endpoint is not open
    #[error("Keyboard not connected")]
    NotConnected,

    /// Backup data of the wrong size
    #[error("Backup must be exactly {expected} bytes, got {actual}")]
    BackupSize { expected: usize, actual: usize },

    /// Backup sink or source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

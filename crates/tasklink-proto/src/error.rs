//! Error types for the wire codec.

use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::frame::PayloadKind;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding protocol traffic.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The underlying channel failed or ended early.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The command token does not name a known command.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The peer speaks another frame version.
    #[error("Unsupported protocol version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the frame.
        found: u16,
        /// Version this codec speaks.
        expected: u16,
    },

    /// A frame carried a different payload than the exchange calls for.
    #[error("Expected {expected} payload, received {found}")]
    UnexpectedPayload {
        /// Payload kind the caller asked for.
        expected: PayloadKind,
        /// Payload kind that arrived.
        found: PayloadKind,
    },

    /// A frame body does not decode to the expected shape.
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An acknowledgement byte other than 0 or 1.
    #[error("Invalid boolean byte: {0:#04x}")]
    InvalidBool(u8),

    /// A frame or text token exceeds its length limit.
    #[error("Frame of {0} bytes exceeds the size limit")]
    FrameTooLarge(usize),

    /// A text token is not valid UTF-8.
    #[error("Invalid text token: {0}")]
    InvalidText(#[from] FromUtf8Error),
}

impl ProtocolError {
    /// Whether the error stems from the connection itself (refused, reset,
    /// timed out, ...) rather than from the bytes that were exchanged.
    ///
    /// A stream that ends in the middle of a response counts as a protocol
    /// error.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

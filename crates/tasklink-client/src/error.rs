//! Error types for client operations.

use std::io;

use tasklink_proto::ProtocolError;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Broad classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The connection was refused, reset, timed out or is missing.
    /// Retrying after a reconnect is meaningful.
    Connectivity,
    /// The peer sent bytes that do not decode to the expected shape.
    Protocol,
}

/// Errors that can occur while talking to the task server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Dialing or configuring the channel failed.
    #[error("Connection failed: {0}")]
    Connectivity(#[source] io::Error),

    /// No channel is open.
    #[error("Not connected to a server")]
    NotConnected,

    /// `reconnect` was called before any endpoint was known.
    #[error("No server endpoint configured")]
    NotConfigured,

    /// Encoding, decoding or the exchange itself failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// Classify the failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connectivity(_) | Self::NotConnected | Self::NotConfigured => ErrorKind::Connectivity,
            Self::Protocol(err) if err.is_connectivity() => ErrorKind::Connectivity,
            Self::Protocol(_) => ErrorKind::Protocol,
        }
    }

    /// Whether retrying after a reconnect can help.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Connectivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_io_timeouts_count_as_connectivity() {
        let err = ClientError::from(ProtocolError::Io(io::Error::from(io::ErrorKind::TimedOut)));
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert!(err.is_retryable());
    }

    #[test]
    fn malformed_payloads_are_protocol_errors() {
        let err = ClientError::from(ProtocolError::InvalidBool(9));
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(!err.is_retryable());

        let eof = ClientError::from(ProtocolError::Io(io::Error::from(io::ErrorKind::UnexpectedEof)));
        assert_eq!(eof.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn missing_channel_is_connectivity() {
        assert_eq!(ClientError::NotConnected.kind(), ErrorKind::Connectivity);
        assert_eq!(ClientError::NotConfigured.kind(), ErrorKind::Connectivity);
    }
}

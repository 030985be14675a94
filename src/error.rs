//! Error types for the chat transport
//!
//! The registry itself never fails a caller; these errors come from the
//! TCP transport: socket I/O, the name handshake and the line protocol.

use std::fmt;
use std::io;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Socket I/O error
    Io(io::Error),
    /// Name handshake failed
    Handshake(HandshakeError),
    /// Peer violated the line protocol
    Protocol(ProtocolError),
}

/// Errors during the display name handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// First line was blank
    EmptyName,
    /// No name arrived within the connection timeout
    Timeout,
    /// Peer disconnected before sending a name
    Disconnected,
}

/// Line protocol violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Line exceeded the configured maximum length
    LineTooLong(usize),
    /// Line was not valid UTF-8
    InvalidUtf8,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Handshake(e) => write!(f, "Handshake error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
        }
    }
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::EmptyName => write!(f, "display name must not be empty"),
            HandshakeError::Timeout => write!(f, "timed out waiting for display name"),
            HandshakeError::Disconnected => write!(f, "disconnected before sending a name"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::LineTooLong(max) => write!(f, "line longer than {} bytes", max),
            ProtocolError::InvalidUtf8 => write!(f, "line is not valid UTF-8"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Handshake(e) => Some(e),
            Error::Protocol(e) => Some(e),
        }
    }
}

impl std::error::Error for HandshakeError {}
impl std::error::Error for ProtocolError {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<HandshakeError> for Error {
    fn from(e: HandshakeError) -> Self {
        Error::Handshake(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err: Error = HandshakeError::EmptyName.into();
        assert_eq!(
            err.to_string(),
            "Handshake error: display name must not be empty"
        );

        let err: Error = ProtocolError::LineTooLong(16).into();
        assert_eq!(err.to_string(), "Protocol error: line longer than 16 bytes");
    }

    #[test]
    fn test_source() {
        use std::error::Error as _;

        let err: Error = io::Error::new(io::ErrorKind::ConnectionReset, "reset").into();
        assert!(err.source().is_some());
        assert!(matches!(err, Error::Io(_)));
    }
}

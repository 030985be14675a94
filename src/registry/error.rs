//! Registry error types
//!
//! The registry has a single failure kind: delivering a message to one
//! connection failed. It never escapes a broadcast; it only drives removal
//! of the member that produced it.

/// Error returned by [`Connection::send`](super::Connection::send)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The connection is closed (peer gone or writer dropped)
    Closed,
    /// The send did not complete within the configured timeout
    Timeout,
    /// Transport-level write failure
    Io(String),
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::Closed => write!(f, "Connection closed"),
            SendError::Timeout => write!(f, "Send timed out"),
            SendError::Io(reason) => write!(f, "Send failed: {}", reason),
        }
    }
}

impl std::error::Error for SendError {}

impl From<std::io::Error> for SendError {
    fn from(err: std::io::Error) -> Self {
        SendError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(SendError::Closed.to_string(), "Connection closed");
        assert_eq!(SendError::Timeout.to_string(), "Send timed out");
        assert_eq!(
            SendError::Io("broken pipe".into()).to_string(),
            "Send failed: broken pipe"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        assert_eq!(SendError::from(io), SendError::Io("pipe closed".into()));
    }
}

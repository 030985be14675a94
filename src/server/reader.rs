//! Line-oriented inbound reader
//!
//! Each `\n`-terminated line (a trailing `\r` is dropped) is one message.
//! The first line a client sends is its display name.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::{Error, HandshakeError, ProtocolError, Result};
use crate::session::Inbound;

/// Reads bounded-length UTF-8 lines
pub struct LineReader<R> {
    inner: R,
    max_line_length: usize,
}

impl<R: AsyncBufRead + Unpin + Send> LineReader<R> {
    /// Create a reader rejecting lines longer than `max_line_length` bytes
    pub fn new(inner: R, max_line_length: usize) -> Self {
        Self {
            inner,
            max_line_length,
        }
    }

    /// Read the next line
    ///
    /// Returns `Ok(None)` at end of stream. A final line without a
    /// terminator is still returned.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        // Room for the longest allowed line plus "\r\n"
        let limit = (self.max_line_length as u64).saturating_add(2);
        let mut buf = Vec::new();

        let n = (&mut self.inner).take(limit).read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        if buf.len() > self.max_line_length {
            return Err(ProtocolError::LineTooLong(self.max_line_length).into());
        }

        String::from_utf8(buf)
            .map(Some)
            .map_err(|_| ProtocolError::InvalidUtf8.into())
    }

    /// Read the display name sent as the first line
    ///
    /// Surrounding whitespace is trimmed; a blank name is rejected.
    pub async fn read_display_name(&mut self, timeout: Duration) -> Result<String> {
        let line = tokio::time::timeout(timeout, self.read_line())
            .await
            .map_err(|_| Error::from(HandshakeError::Timeout))??;

        let line = line.ok_or(HandshakeError::Disconnected)?;
        let name = line.trim();
        if name.is_empty() {
            return Err(HandshakeError::EmptyName.into());
        }

        Ok(name.to_string())
    }
}

impl<R: AsyncBufRead + Unpin + Send> Inbound for LineReader<R> {
    async fn recv(&mut self) -> Option<String> {
        match self.read_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "Inbound read failed, treating as disconnect");
                None
            }
        }
    }
}

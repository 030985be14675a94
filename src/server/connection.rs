//! Outbound side of a TCP chat connection
//!
//! Every connection gets a bounded queue drained by its own writer task.
//! Sending only enqueues, so one slow socket fills its own queue (and then
//! runs into the registry's send timeout) without holding up anyone else.

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::registry::{Connection, ConnectionId, Message, SendError};

/// Registry handle for a TCP client
#[derive(Debug)]
pub struct TcpConnection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    tx: mpsc::Sender<Bytes>,
}

impl TcpConnection {
    /// Start the writer task for `writer` and return the handle feeding it
    ///
    /// The task ends once every handle is dropped or a write fails.
    pub fn spawn<W>(
        id: ConnectionId,
        peer_addr: SocketAddr,
        writer: W,
        queue: usize,
    ) -> (Self, JoinHandle<()>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(queue);
        let task = tokio::spawn(write_loop(id, writer, rx));

        (Self { id, peer_addr, tx }, task)
    }

    /// Remote peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Check if the writer task has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Connection for TcpConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send(&self, message: &Message) -> Result<(), SendError> {
        self.tx
            .send(message.to_line())
            .await
            .map_err(|_| SendError::Closed)
    }
}

async fn write_loop<W>(id: ConnectionId, mut writer: W, mut rx: mpsc::Receiver<Bytes>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        if let Err(e) = write_line(&mut writer, &line).await {
            tracing::debug!(connection = %id, error = %e, "Write failed, closing writer");
            return;
        }
    }

    let _ = writer.shutdown().await;
    tracing::debug!(connection = %id, "Writer closed");
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &[u8]) -> std::io::Result<()> {
    writer.write_all(line).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use tokio_test::io::Builder;

    use super::*;

    fn addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40000)
    }

    #[tokio::test]
    async fn test_send_writes_lines() {
        let mock = Builder::new()
            .write(b"alice joined the chat\n")
            .write(b"alice: hi\n")
            .build();
        let (conn, task) = TcpConnection::spawn(ConnectionId::new(1), addr(), mock, 4);

        conn.send(&Message::joined("alice")).await.unwrap();
        conn.send(&Message::chat("alice", "hi")).await.unwrap();
        drop(conn);

        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_after_write_failure() {
        let mock = Builder::new()
            .write_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "peer gone",
            ))
            .build();
        let (conn, task) = TcpConnection::spawn(ConnectionId::new(2), addr(), mock, 4);

        // First send is queued; the writer then fails and exits
        conn.send(&Message::text("lost")).await.unwrap();
        task.await.unwrap();

        assert!(conn.is_closed());
        assert_eq!(
            conn.send(&Message::text("late")).await,
            Err(SendError::Closed)
        );
    }

    #[tokio::test]
    async fn test_full_queue_blocks_send() {
        // Nobody reads the other end, so the writer stalls once the pipe is full
        let (client, _peer) = tokio::io::duplex(8);
        let (conn, task) = TcpConnection::spawn(ConnectionId::new(3), addr(), client, 1);

        let mut queued = 0;
        for i in 0..16 {
            let message = Message::text(format!("line {}", i));
            match tokio::time::timeout(Duration::from_millis(50), conn.send(&message)).await {
                Ok(Ok(())) => queued += 1,
                _ => break,
            }
        }

        assert!(queued < 16);
        assert!(!conn.is_closed());
        task.abort();
    }
}

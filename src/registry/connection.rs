//! Connection identity and the transport send contract
//!
//! The registry treats a connection as an opaque handle with two
//! capabilities: it can be identified, and it can be sent a message.

use std::future::Future;

use super::error::SendError;
use super::message::Message;

/// Identity of a connection within a registry
///
/// Two handles refer to the same connection exactly when their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a connection id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ConnectionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A bidirectional text channel supplied by the transport layer
///
/// Implementations should fail fast once the peer is gone; the registry
/// bounds every send with its configured timeout regardless.
///
/// ```
/// use chat_relay::registry::{Connection, ConnectionId, Message, SendError};
/// use tokio::sync::mpsc;
///
/// struct ChannelConnection {
///     id: ConnectionId,
///     tx: mpsc::Sender<Message>,
/// }
///
/// impl Connection for ChannelConnection {
///     fn id(&self) -> ConnectionId {
///         self.id
///     }
///
///     async fn send(&self, message: &Message) -> Result<(), SendError> {
///         self.tx.send(message.clone()).await.map_err(|_| SendError::Closed)
///     }
/// }
/// ```
pub trait Connection: Send + Sync + 'static {
    /// Identity of this connection
    fn id(&self) -> ConnectionId;

    /// Deliver one message to the peer
    fn send(&self, message: &Message) -> impl Future<Output = Result<(), SendError>> + Send;
}

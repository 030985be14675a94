//! Chat session driver
//!
//! Runs one connection through the room: join, relay every inbound line as
//! a chat message, then leave and tell the others. A member removed after a
//! failed send has its session ended too.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;

use crate::registry::{Connection, ConnectionId, ConnectionRegistry, Message};

/// Source of inbound text for one connection
///
/// `None` means the peer disconnected.
pub trait Inbound: Send {
    /// Wait for the next inbound message
    fn recv(&mut self) -> impl Future<Output = Option<String>> + Send;
}

impl Inbound for mpsc::Receiver<String> {
    async fn recv(&mut self) -> Option<String> {
        mpsc::Receiver::recv(self).await
    }
}

/// What happened during a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Connection the session ran for
    pub id: ConnectionId,
    /// Chat lines relayed to the room
    pub messages: u64,
    /// Whether the member was removed after a failed send rather than
    /// leaving on its own. The departure is announced either way.
    pub evicted: bool,
}

/// One member's lifecycle in a room
pub struct ChatSession<C> {
    registry: Arc<ConnectionRegistry<C>>,
    connection: Arc<C>,
    display_name: String,
}

impl<C: Connection> ChatSession<C> {
    /// Create a session for `connection` under `display_name`
    pub fn new(
        registry: Arc<ConnectionRegistry<C>>,
        connection: Arc<C>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            connection,
            display_name: display_name.into(),
        }
    }

    /// Connection id of this session
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    /// Display name of this session
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Run until `inbound` reports a disconnect or the member is evicted
    ///
    /// The remaining members are told about the departure exactly once.
    pub async fn run<I: Inbound>(self, mut inbound: I) -> SessionSummary {
        let id = self.id();
        // Subscribe first so an eviction during the join announcement is seen
        let mut evictions = self.registry.evictions();
        self.registry
            .join(Arc::clone(&self.connection), self.display_name.as_str())
            .await;

        let mut messages = 0;
        loop {
            let text = tokio::select! {
                text = inbound.recv() => text,
                _ = wait_for_eviction(&self.registry, &mut evictions, id) => {
                    tracing::info!(connection = %id, name = %self.display_name, "Member evicted, ending session");
                    None
                }
            };
            let Some(text) = text else { break };

            self.registry
                .broadcast(Message::chat(&self.display_name, &text))
                .await;
            messages += 1;
        }

        let evicted = match self.registry.leave_and_announce(id).await {
            Some(_) => false,
            None => {
                self.registry
                    .broadcast(Message::left(&self.display_name))
                    .await;
                true
            }
        };

        tracing::debug!(
            connection = %id,
            name = %self.display_name,
            messages = messages,
            evicted = evicted,
            "Session finished"
        );

        SessionSummary {
            id,
            messages,
            evicted,
        }
    }
}

/// Resolve once `id` has been evicted from `registry`
async fn wait_for_eviction<C: Connection>(
    registry: &ConnectionRegistry<C>,
    evictions: &mut broadcast::Receiver<ConnectionId>,
    id: ConnectionId,
) {
    loop {
        match evictions.recv().await {
            Ok(evicted) if evicted == id => return,
            Ok(_) => {}
            Err(RecvError::Lagged(_)) => {
                if !registry.contains(id).await {
                    return;
                }
            }
            // The registry outlives its sessions
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::testing::MockConnection;

    #[tokio::test]
    async fn test_session_flow() {
        let registry = Arc::new(ConnectionRegistry::new());
        let observer = Arc::new(MockConnection::new(100));
        registry.join(Arc::clone(&observer), "observer").await;

        let conn = Arc::new(MockConnection::new(1));
        let session = ChatSession::new(Arc::clone(&registry), Arc::clone(&conn), "alice");
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(session.run(rx));

        tx.send("hello".to_string()).await.unwrap();
        tx.send("bye".to_string()).await.unwrap();
        drop(tx);

        let summary = task.await.unwrap();

        assert_eq!(summary.id, ConnectionId::new(1));
        assert_eq!(summary.messages, 2);
        assert!(!summary.evicted);
        assert_eq!(registry.len().await, 1);
        assert_eq!(
            observer.received(),
            vec![
                "observer joined the chat",
                "alice joined the chat",
                "alice: hello",
                "alice: bye",
                "alice left the chat!",
            ]
        );
        assert_eq!(
            conn.received(),
            vec!["alice joined the chat", "alice: hello", "alice: bye"]
        );
    }

    #[tokio::test]
    async fn test_evicted_session_ends() {
        let registry = Arc::new(ConnectionRegistry::new());
        let observer = Arc::new(MockConnection::new(100));
        registry.join(Arc::clone(&observer), "observer").await;

        let conn = Arc::new(MockConnection::new(1));
        let session = ChatSession::new(Arc::clone(&registry), Arc::clone(&conn), "mallory");
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(session.run(rx));

        while !registry.contains(ConnectionId::new(1)).await {
            tokio::task::yield_now().await;
        }

        // The next broadcast fails for mallory and evicts it
        conn.set_failing(true);
        registry.broadcast("flood").await;

        // The session ends on its own while the inbound side is still open
        let summary = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("session must end after eviction")
            .unwrap();

        assert!(summary.evicted);
        assert_eq!(summary.messages, 0);
        assert!(!registry.contains(ConnectionId::new(1)).await);
        assert_eq!(
            observer.received().last().map(String::as_str),
            Some("mallory left the chat!")
        );

        // Lines sent after eviction go nowhere
        assert!(tx.send("i am a ghost".to_string()).await.is_err());
        assert!(!observer
            .received()
            .iter()
            .any(|m| m == "mallory: i am a ghost"));
    }

    #[tokio::test]
    async fn test_eviction_during_join_ends_session() {
        let registry = Arc::new(ConnectionRegistry::new());
        let conn = Arc::new(MockConnection::new(3));
        conn.set_failing(true);
        let (_tx, rx) = mpsc::channel::<String>(1);

        let summary = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            ChatSession::new(Arc::clone(&registry), conn, "dave").run(rx),
        )
        .await
        .expect("session must end after eviction");

        assert!(summary.evicted);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_immediate_disconnect() {
        let registry = Arc::new(ConnectionRegistry::new());
        let conn = Arc::new(MockConnection::new(7));
        let (tx, rx) = mpsc::channel::<String>(1);
        drop(tx);

        let summary = ChatSession::new(Arc::clone(&registry), conn, "carol")
            .run(rx)
            .await;

        assert_eq!(summary.messages, 0);
        assert!(!summary.evicted);
        assert!(registry.is_empty().await);
    }
}

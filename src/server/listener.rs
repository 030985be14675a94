//! Chat server listener
//!
//! Handles TCP accept loop and spawns connection handlers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

use crate::error::{Error, HandshakeError, Result};
use crate::registry::{ConnectionId, ConnectionRegistry, RegistryConfig};
use crate::server::config::ServerConfig;
use crate::server::connection::TcpConnection;
use crate::server::reader::LineReader;
use crate::session::{ChatSession, SessionSummary};
use crate::stats::{ServerCounters, ServerStats};

/// Line-based TCP chat server
pub struct ChatServer {
    config: ServerConfig,
    registry: Arc<ConnectionRegistry<TcpConnection>>,
    next_connection_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
    counters: Arc<ServerCounters>,
}

impl ChatServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry_config(config, RegistryConfig::default())
    }

    /// Create a new server with custom registry configuration
    pub fn with_registry_config(config: ServerConfig, registry_config: RegistryConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            registry: Arc::new(ConnectionRegistry::with_config(registry_config)),
            next_connection_id: AtomicU64::new(1),
            connection_semaphore,
            counters: Arc::new(ServerCounters::new()),
        }
    }

    /// Get a reference to the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry<TcpConnection>> {
        &self.registry
    }

    /// Get server statistics
    pub fn stats(&self) -> ServerStats {
        self.counters.snapshot()
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// Runs forever; returns only if binding the listener fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_until(listener, shutdown).await
    }

    /// Accept connections from an already bound listener until `shutdown` resolves
    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Chat server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.counters
                        .rejected_connections
                        .fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let id = ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed));

        tracing::debug!(connection = %id, peer = %peer_addr, "New connection");

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let config = self.config.clone();
        let registry = Arc::clone(&self.registry);
        let counters = Arc::clone(&self.counters);

        counters.total_connections.fetch_add(1, Ordering::Relaxed);
        counters.active_connections.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(async move {
            match serve_connection(id, socket, peer_addr, &config, registry, permit).await {
                Ok(summary) => {
                    tracing::debug!(
                        connection = %id,
                        messages = summary.messages,
                        evicted = summary.evicted,
                        "Connection closed"
                    );
                }
                Err(e) => {
                    if matches!(e, Error::Handshake(_)) {
                        counters.failed_handshakes.fetch_add(1, Ordering::Relaxed);
                    }
                    tracing::debug!(connection = %id, error = %e, "Connection error");
                }
            }

            counters.active_connections.fetch_sub(1, Ordering::Relaxed);
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }
}

/// Drive one client: name handshake, then a chat session until it disconnects
/// or is evicted
async fn serve_connection(
    id: ConnectionId,
    socket: TcpStream,
    peer_addr: SocketAddr,
    config: &ServerConfig,
    registry: Arc<ConnectionRegistry<TcpConnection>>,
    _permit: Option<OwnedSemaphorePermit>,
) -> Result<SessionSummary> {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = LineReader::new(
        BufReader::with_capacity(config.read_buffer_size, read_half),
        config.max_line_length,
    );

    let name = match reader.read_display_name(config.connection_timeout).await {
        Ok(name) => name,
        Err(e) => {
            if let Error::Handshake(HandshakeError::EmptyName) = e {
                let line = format!("error: {}\n", HandshakeError::EmptyName);
                let _ = write_half.write_all(line.as_bytes()).await;
                let _ = write_half.shutdown().await;
            }
            return Err(e);
        }
    };

    let (connection, writer) =
        TcpConnection::spawn(id, peer_addr, write_half, config.outbound_queue);
    let summary = ChatSession::new(registry, Arc::new(connection), name)
        .run(reader)
        .await;

    // Let queued lines drain before the permit is released
    if !drain_writer(writer, config.connection_timeout).await {
        tracing::debug!(connection = %id, "Writer did not drain in time, aborted");
    }

    Ok(summary)
}

/// Wait up to `limit` for a writer task to finish, aborting it otherwise
///
/// Returns `false` if the writer had to be aborted.
async fn drain_writer(mut writer: JoinHandle<()>, limit: Duration) -> bool {
    match tokio::time::timeout(limit, &mut writer).await {
        Ok(_) => true,
        Err(_) => {
            writer.abort();
            false
        }
    }
}

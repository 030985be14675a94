//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Default port for the chat server
pub const DEFAULT_PORT: u16 = 8000;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Time allowed for a client to send its display name
    pub connection_timeout: Duration,

    /// Longest accepted inbound line in bytes, excluding the line terminator
    pub max_line_length: usize,

    /// Outbound lines queued per connection before sends start waiting
    pub outbound_queue: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Application-level read buffer size
    pub read_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 0, // Unlimited
            connection_timeout: Duration::from_secs(10),
            max_line_length: 4096,
            outbound_queue: 64,
            tcp_nodelay: true,
            read_buffer_size: 8 * 1024,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the display name timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the maximum inbound line length
    pub fn max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max.max(1);
        self
    }

    /// Set the per-connection outbound queue length
    pub fn outbound_queue(mut self, len: usize) -> Self {
        self.outbound_queue = len.max(1);
        self
    }
}

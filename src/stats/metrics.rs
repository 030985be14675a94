//! Statistics for the registry and the chat server

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Registry-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Current number of members
    pub members: u64,
    /// Total joins (re-joins included)
    pub joins: u64,
    /// Explicit leaves that removed a member
    pub leaves: u64,
    /// Members removed after a failed send
    pub evictions: u64,
    /// Broadcasts performed
    pub broadcasts: u64,
    /// Successful per-member deliveries
    pub deliveries: u64,
    /// Failed per-member sends (timeouts included)
    pub failed_sends: u64,
}

/// Live counters behind [`RegistryStats`]
#[derive(Debug, Default)]
pub(crate) struct RegistryCounters {
    pub joins: AtomicU64,
    pub leaves: AtomicU64,
    pub evictions: AtomicU64,
    pub broadcasts: AtomicU64,
    pub deliveries: AtomicU64,
    pub failed_sends: AtomicU64,
}

impl RegistryCounters {
    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, members: u64) -> RegistryStats {
        RegistryStats {
            members,
            joins: self.joins.load(Ordering::Relaxed),
            leaves: self.leaves.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            failed_sends: self.failed_sends.load(Ordering::Relaxed),
        }
    }
}

/// Server-wide statistics
#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    /// Total connections ever accepted
    pub total_connections: u64,
    /// Current active connections
    pub active_connections: u64,
    /// Connections rejected by the connection limit
    pub rejected_connections: u64,
    /// Connections that failed the name handshake
    pub failed_handshakes: u64,
    /// Uptime
    pub uptime: Duration,
}

/// Live counters behind [`ServerStats`]
#[derive(Debug)]
pub(crate) struct ServerCounters {
    started_at: Instant,
    pub total_connections: AtomicU64,
    pub active_connections: AtomicU64,
    pub rejected_connections: AtomicU64,
    pub failed_handshakes: AtomicU64,
}

impl ServerCounters {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_connections: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            rejected_connections: AtomicU64::new(0),
            failed_handshakes: AtomicU64::new(0),
        }
    }

    pub(crate) fn snapshot(&self) -> ServerStats {
        ServerStats {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            rejected_connections: self.rejected_connections.load(Ordering::Relaxed),
            failed_handshakes: self.failed_handshakes.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

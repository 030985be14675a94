//! Member entry types
//!
//! This module defines the per-connection state stored in the registry.

use std::sync::Arc;
use std::time::Instant;

use super::connection::{Connection, ConnectionId};

/// Entry for a single member in the registry
pub(super) struct MemberEntry<C> {
    /// Connection handle shared with the transport
    pub connection: Arc<C>,

    /// Display name chosen at join time
    pub display_name: Arc<str>,

    /// Join order; kept across a re-join so fan-out order stays stable
    pub order: u64,

    /// Bumped on every join so a stale send failure cannot evict a newer join
    pub epoch: u64,

    /// When the member joined
    pub joined_at: Instant,
}

impl<C: Connection> MemberEntry<C> {
    pub(super) fn new(connection: Arc<C>, display_name: Arc<str>, order: u64, epoch: u64) -> Self {
        Self {
            connection,
            display_name,
            order,
            epoch,
            joined_at: Instant::now(),
        }
    }

    pub(super) fn info(&self) -> MemberInfo {
        MemberInfo {
            id: self.connection.id(),
            display_name: Arc::clone(&self.display_name),
            joined_at: self.joined_at,
        }
    }

    pub(super) fn target(&self) -> Target<C> {
        Target {
            connection: Arc::clone(&self.connection),
            epoch: self.epoch,
            order: self.order,
        }
    }
}

/// One recipient of a broadcast, captured while the lock was held
pub(super) struct Target<C> {
    pub connection: Arc<C>,
    pub epoch: u64,
    pub order: u64,
}

/// Public view of a member
#[derive(Debug, Clone)]
pub struct MemberInfo {
    /// Connection id
    pub id: ConnectionId,
    /// Display name
    pub display_name: Arc<str>,
    /// When the member joined
    pub joined_at: Instant,
}

//! Connection registry implementation
//!
//! The central registry that tracks chat members and fans messages out
//! to all of them.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use super::config::RegistryConfig;
use super::connection::{Connection, ConnectionId};
use super::entry::{MemberEntry, MemberInfo, Target};
use super::error::SendError;
use super::message::Message;
use crate::stats::{RegistryCounters, RegistryStats};

/// Capacity of the eviction notification channel. Receivers that fall
/// behind see `RecvError::Lagged` and should re-check membership.
const EVICTION_CHANNEL_CAPACITY: usize = 256;

/// Membership mapping guarded by the registry lock
struct Members<C> {
    entries: HashMap<ConnectionId, MemberEntry<C>>,
    next_order: u64,
    next_epoch: u64,
}

impl<C> Members<C> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            next_order: 0,
            next_epoch: 0,
        }
    }

    fn next_epoch(&mut self) -> u64 {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        epoch
    }

    fn next_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }
}

/// Outcome of a single broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Members the message was delivered to
    pub delivered: usize,
    /// Members removed because their send failed
    pub evicted: Vec<ConnectionId>,
}

/// Registry of chat members
///
/// Thread-safe via `RwLock`. Broadcasts only hold the lock long enough to
/// snapshot the member list and, afterwards, to remove members whose send
/// failed. Sends run with no lock held, so a slow receiver never blocks
/// joins, leaves or other broadcasts.
pub struct ConnectionRegistry<C> {
    /// Map of connection id to member entry
    members: RwLock<Members<C>>,

    /// Configuration
    config: RegistryConfig,

    /// Lifetime counters
    counters: RegistryCounters,

    /// Ids of members removed after a failed send
    evictions: broadcast::Sender<ConnectionId>,
}

impl<C: Connection> ConnectionRegistry<C> {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            members: RwLock::new(Members::with_capacity(config.initial_capacity)),
            config,
            counters: RegistryCounters::default(),
            evictions: broadcast::channel(EVICTION_CHANNEL_CAPACITY).0,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a member and announce it
    ///
    /// The announcement goes to every member, the new one included. If the
    /// connection is already present its display name is overwritten and it
    /// keeps its place in the fan-out order.
    pub async fn join(&self, connection: Arc<C>, display_name: impl Into<String>) {
        let display_name: Arc<str> = Arc::from(display_name.into());
        let id = connection.id();

        {
            let mut members = self.members.write().await;
            let epoch = members.next_epoch();

            if let Some(entry) = members.entries.get_mut(&id) {
                tracing::debug!(
                    connection = %id,
                    previous = %entry.display_name,
                    name = %display_name,
                    "Member re-joined, display name replaced"
                );
                entry.connection = connection;
                entry.display_name = Arc::clone(&display_name);
                entry.epoch = epoch;
            } else {
                let order = members.next_order();
                let entry = MemberEntry::new(connection, Arc::clone(&display_name), order, epoch);
                members.entries.insert(id, entry);
            }

            tracing::info!(
                connection = %id,
                name = %display_name,
                members = members.entries.len(),
                "Member joined"
            );
        }

        RegistryCounters::add(&self.counters.joins, 1);
        self.broadcast(Message::joined(&display_name)).await;
    }

    /// Remove a member
    ///
    /// Returns the member's display name, or `None` if the connection was not
    /// registered. Nothing is announced; see [`leave_and_announce`](Self::leave_and_announce).
    pub async fn leave(&self, id: ConnectionId) -> Option<Arc<str>> {
        let mut members = self.members.write().await;
        let entry = members.entries.remove(&id)?;

        RegistryCounters::add(&self.counters.leaves, 1);
        tracing::info!(
            connection = %id,
            name = %entry.display_name,
            members = members.entries.len(),
            "Member left"
        );

        Some(entry.display_name)
    }

    /// Remove a member and tell the remaining members it left
    pub async fn leave_and_announce(&self, id: ConnectionId) -> Option<Arc<str>> {
        let name = self.leave(id).await?;
        self.broadcast(Message::left(&name)).await;
        Some(name)
    }

    /// Subscribe to evictions
    ///
    /// Receives the id of every member removed after a failed send. Explicit
    /// leaves are not reported.
    pub fn evictions(&self) -> broadcast::Receiver<ConnectionId> {
        self.evictions.subscribe()
    }

    /// Send a message to every member
    ///
    /// Delivery is best-effort and follows join order. A member whose send
    /// fails (or times out) is removed once the fan-out completes; the
    /// failure itself is never returned.
    ///
    /// Sends run one after another, so a stalled member delays the members
    /// after it, and the caller, by up to `send_timeout`. Transports should
    /// make `send` cheap (the TCP transport only enqueues) so that the
    /// timeout is reached only by members that are actually stuck.
    pub async fn broadcast(&self, message: impl Into<Message>) -> BroadcastReport {
        let message = message.into();
        let targets = self.targets().await;

        let mut delivered = 0;
        let mut failed = Vec::new();

        for target in &targets {
            match self.send_to(&target.connection, &message).await {
                Ok(()) => delivered += 1,
                Err(err) => failed.push((target.connection.id(), target.epoch, err)),
            }
        }

        RegistryCounters::add(&self.counters.broadcasts, 1);
        RegistryCounters::add(&self.counters.deliveries, delivered as u64);
        RegistryCounters::add(&self.counters.failed_sends, failed.len() as u64);

        tracing::debug!(
            kind = ?message.kind,
            recipients = targets.len(),
            delivered = delivered,
            failed = failed.len(),
            "Broadcast complete"
        );

        let evicted = if failed.is_empty() {
            Vec::new()
        } else {
            self.evict(failed).await
        };

        BroadcastReport { delivered, evicted }
    }

    /// Check if a connection is registered
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.members.read().await.entries.contains_key(&id)
    }

    /// Get the display name of a registered connection
    pub async fn display_name(&self, id: ConnectionId) -> Option<Arc<str>> {
        self.members
            .read()
            .await
            .entries
            .get(&id)
            .map(|entry| Arc::clone(&entry.display_name))
    }

    /// Get all members in join order
    pub async fn members(&self) -> Vec<MemberInfo> {
        let members = self.members.read().await;
        let mut entries: Vec<_> = members.entries.values().collect();
        entries.sort_by_key(|entry| entry.order);
        entries.into_iter().map(MemberEntry::info).collect()
    }

    /// Get number of members
    pub async fn len(&self) -> usize {
        self.members.read().await.entries.len()
    }

    /// Check if there are no members
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.entries.is_empty()
    }

    /// Get registry statistics
    pub async fn stats(&self) -> RegistryStats {
        let members = self.len().await as u64;
        self.counters.snapshot(members)
    }

    /// Snapshot the current members in join order
    async fn targets(&self) -> Vec<Target<C>> {
        let members = self.members.read().await;
        let mut targets: Vec<Target<C>> = members.entries.values().map(MemberEntry::target).collect();
        targets.sort_by_key(|target| target.order);
        targets
    }

    async fn send_to(&self, connection: &C, message: &Message) -> Result<(), SendError> {
        match self.config.send_timeout {
            Some(limit) => tokio::time::timeout(limit, connection.send(message))
                .await
                .unwrap_or(Err(SendError::Timeout)),
            None => connection.send(message).await,
        }
    }

    /// Remove members whose send failed
    ///
    /// An entry is only removed if it is still the join the failed send was
    /// addressed to; a connection that left and re-joined meanwhile stays.
    async fn evict(&self, failed: Vec<(ConnectionId, u64, SendError)>) -> Vec<ConnectionId> {
        let mut members = self.members.write().await;
        let mut evicted = Vec::with_capacity(failed.len());

        for (id, epoch, err) in failed {
            let current = members.entries.get(&id).map(|entry| entry.epoch);
            if current != Some(epoch) {
                tracing::debug!(connection = %id, error = %err, "Send failed for stale member, skipping removal");
                continue;
            }

            if let Some(entry) = members.entries.remove(&id) {
                tracing::warn!(
                    connection = %id,
                    name = %entry.display_name,
                    error = %err,
                    "Member removed after failed send"
                );
                evicted.push(id);
                // No receivers is fine
                let _ = self.evictions.send(id);
            }
        }

        RegistryCounters::add(&self.counters.evictions, evicted.len() as u64);
        evicted
    }
}

impl<C: Connection> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

//! Registry configuration

use std::time::Duration;

/// Configuration for a [`ConnectionRegistry`](super::ConnectionRegistry)
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Upper bound on a single send; exceeding it counts as a failed send.
    /// `None` lets sends run unbounded.
    pub send_timeout: Option<Duration>,

    /// Number of members to reserve space for up front
    pub initial_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            send_timeout: Some(Duration::from_secs(5)),
            initial_capacity: 64,
        }
    }
}

impl RegistryConfig {
    /// Set the per-send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Let sends run without a timeout
    pub fn disable_send_timeout(mut self) -> Self {
        self.send_timeout = None;
        self
    }

    /// Set the initial member capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

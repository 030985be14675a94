//! Statistics and counters

pub mod metrics;

pub use metrics::{RegistryStats, ServerStats};
pub(crate) use metrics::{RegistryCounters, ServerCounters};

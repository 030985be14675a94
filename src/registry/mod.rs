//! Connection registry for chat fan-out
//!
//! The registry tracks which connections are in the room, the display name
//! each one joined with, and delivers every broadcast to all of them.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<ConnectionRegistry<C>>
//!                     ┌───────────────────────────┐
//!                     │ members: HashMap<Id,      │
//!                     │   MemberEntry {           │
//!                     │     connection: Arc<C>,   │
//!                     │     display_name,         │
//!                     │   }                       │
//!                     │ >                         │
//!                     └─────────────┬─────────────┘
//!                                   │ snapshot (read lock)
//!         ┌─────────────────────────┼─────────────────────────┐
//!         ▼                         ▼                         ▼
//!    conn.send()               conn.send()               conn.send()
//!         │                         │                         │
//!         └──── failures ───────────┴──► evict (write lock) ◄─┘
//! ```
//!
//! # Failure handling
//!
//! A failed send is never reported to the broadcaster. It removes the
//! member that produced it once the fan-out has visited every member, so
//! one dead peer neither interrupts delivery nor needs a separate health
//! check. Removed ids are published on [`ConnectionRegistry::evictions`].

pub mod config;
pub mod connection;
pub mod entry;
pub mod error;
pub mod message;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RegistryConfig;
pub use connection::{Connection, ConnectionId};
pub use entry::MemberInfo;
pub use error::SendError;
pub use message::{Message, MessageKind};
pub use store::{BroadcastReport, ConnectionRegistry};

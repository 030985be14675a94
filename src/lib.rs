//! # chat-relay
//!
//! Connection registry and best-effort broadcast fan-out for chat rooms.
//!
//! The core is [`ConnectionRegistry`]: it tracks which connections are in a
//! room and the display name each joined with, and delivers every broadcast
//! to all of them. A member whose send fails is dropped from the room as
//! part of the broadcast itself.
//!
//! Around it sit a [`ChatSession`](session::ChatSession) driver (join, relay
//! chat lines, leave and announce) and a small line-based TCP transport,
//! [`ChatServer`].
//!
//! ## Example
//!
//! ```no_run
//! use chat_relay::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> chat_relay::error::Result<()> {
//!     let server = ChatServer::new(ServerConfig::default());
//!     server.run().await
//! }
//! ```

pub mod error;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use registry::{
    BroadcastReport, Connection, ConnectionId, ConnectionRegistry, Message, RegistryConfig,
    SendError,
};
pub use server::{ChatServer, ServerConfig};

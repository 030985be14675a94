//! Line-based TCP chat server
//!
//! A minimal transport for the registry: the first line a client sends is
//! its display name, every later line is relayed to the room as
//! `"{name}: {line}"`, and every message the room produces is written back
//! as one line.

pub mod config;
pub mod connection;
pub mod listener;
pub mod reader;

pub use config::ServerConfig;
pub use connection::TcpConnection;
pub use listener::ChatServer;
pub use reader::LineReader;

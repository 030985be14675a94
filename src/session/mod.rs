//! Per-connection chat sessions

pub mod chat;

pub use chat::{ChatSession, Inbound, SessionSummary};

//! Chat message types
//!
//! Messages are what the registry fans out. The text is reference counted,
//! so cloning a message per recipient never copies the payload.

use std::sync::Arc;

use bytes::Bytes;

/// Kind of chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// `"{name} joined the chat"`
    Joined,
    /// `"{name}: {text}"`
    Chat,
    /// `"{name} left the chat!"`
    Left,
    /// Arbitrary text passed straight through
    Text,
}

/// A text message to be broadcast to members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Kind of message
    pub kind: MessageKind,
    text: Arc<str>,
}

impl Message {
    /// Join announcement for `name`
    pub fn joined(name: &str) -> Self {
        Self::with_kind(MessageKind::Joined, format!("{} joined the chat", name))
    }

    /// Chat line from `name`
    pub fn chat(name: &str, text: &str) -> Self {
        Self::with_kind(MessageKind::Chat, format!("{}: {}", name, text))
    }

    /// Leave announcement for `name`
    ///
    /// The trailing `!` is part of the format; the join announcement has none.
    pub fn left(name: &str) -> Self {
        Self::with_kind(MessageKind::Left, format!("{} left the chat!", name))
    }

    /// Raw text message
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_kind(MessageKind::Text, text.into())
    }

    fn with_kind(kind: MessageKind, text: String) -> Self {
        Self {
            kind,
            text: Arc::from(text),
        }
    }

    /// The message text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Encode as a single `\n`-terminated line for line-oriented transports
    pub fn to_line(&self) -> Bytes {
        let mut line = Vec::with_capacity(self.text.len() + 1);
        line.extend_from_slice(self.text.as_bytes());
        line.push(b'\n');
        Bytes::from(line)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        assert_eq!(Message::joined("alice").as_str(), "alice joined the chat");
        assert_eq!(Message::chat("alice", "hi").as_str(), "alice: hi");
        assert_eq!(Message::left("alice").as_str(), "alice left the chat!");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Message::joined("a").kind, MessageKind::Joined);
        assert_eq!(Message::chat("a", "b").kind, MessageKind::Chat);
        assert_eq!(Message::left("a").kind, MessageKind::Left);
        assert_eq!(Message::from("raw").kind, MessageKind::Text);
    }

    #[test]
    fn test_chat_keeps_text_verbatim() {
        let msg = Message::chat("bob", "a: b: c");
        assert_eq!(msg.as_str(), "bob: a: b: c");

        let empty = Message::chat("bob", "");
        assert_eq!(empty.as_str(), "bob: ");
    }

    #[test]
    fn test_to_line() {
        let line = Message::left("bob").to_line();
        assert_eq!(&line[..], b"bob left the chat!\n");
    }

    #[test]
    fn test_clone_shares_text() {
        let msg = Message::text("shared");
        let copy = msg.clone();
        assert!(std::ptr::eq(msg.as_str(), copy.as_str()));
    }
}

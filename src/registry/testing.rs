//! In-memory connection used by the crate's tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::connection::{Connection, ConnectionId};
use super::error::SendError;
use super::message::Message;

/// Records every delivered message; can be told to fail or to stall
pub(crate) struct MockConnection {
    id: ConnectionId,
    received: Mutex<Vec<String>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MockConnection {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id: ConnectionId::new(id),
            received: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
        }
    }

    pub(crate) fn with_delay(id: u64, delay: Duration) -> Self {
        Self {
            delay: Mutex::new(Some(delay)),
            ..Self::new(id)
        }
    }

    pub(crate) fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

impl Connection for MockConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send(&self, message: &Message) -> Result<(), SendError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SendError::Closed);
        }
        self.received.lock().unwrap().push(message.as_str().to_string());
        Ok(())
    }
}

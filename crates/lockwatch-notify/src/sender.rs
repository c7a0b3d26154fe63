//! Outbound message sender abstraction.

use crate::error::{SendError, SendResult};
use lockwatch_core::BoxFuture;
use std::sync::Arc;

/// Sends text to a messaging destination.
///
/// Delivery is best-effort: callers log failures and move on.
pub trait MessageSender: Send + Sync {
    /// Send `text` to `destination` (a chat id for Telegram).
    fn send<'a>(&'a self, destination: &'a str, text: &'a str) -> BoxFuture<'a, SendResult<()>>;
}

/// Arc wrapper for MessageSender trait objects.
pub type DynMessageSender = Arc<dyn MessageSender>;

/// Mock sender for testing.
#[derive(Debug)]
pub struct MockSender {
    /// Recorded `(destination, text)` pairs.
    sends: parking_lot::Mutex<Vec<(String, String)>>,
    /// Error returned by every send while set.
    failure: parking_lot::Mutex<Option<SendError>>,
}

impl Default for MockSender {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSender {
    /// Create a new mock sender.
    pub fn new() -> Self {
        Self {
            sends: parking_lot::Mutex::new(Vec::new()),
            failure: parking_lot::Mutex::new(None),
        }
    }

    /// Make subsequent sends fail with `error`, or succeed with `None`.
    pub fn set_failure(&self, error: Option<SendError>) {
        *self.failure.lock() = error;
    }

    /// Get recorded sends. Failed sends are recorded too.
    pub fn get_sends(&self) -> Vec<(String, String)> {
        self.sends.lock().clone()
    }

    /// Number of recorded sends.
    pub fn send_count(&self) -> usize {
        self.sends.lock().len()
    }

    /// Clear recorded sends.
    pub fn clear_sends(&self) {
        self.sends.lock().clear();
    }
}

impl MessageSender for MockSender {
    fn send<'a>(&'a self, destination: &'a str, text: &'a str) -> BoxFuture<'a, SendResult<()>> {
        Box::pin(async move {
            self.sends
                .lock()
                .push((destination.to_string(), text.to_string()));
            match self.failure.lock().clone() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        })
    }
}

//! Event notifier.

use crate::error::SendResult;
use crate::formatter::format_event;
use crate::sender::DynMessageSender;
use lockwatch_core::EnrichedEvent;
use tracing::debug;

/// Formats events and sends them to one destination.
#[derive(Clone)]
pub struct Notifier {
    sender: DynMessageSender,
    destination: String,
}

impl Notifier {
    pub fn new(sender: DynMessageSender, destination: impl Into<String>) -> Self {
        Self {
            sender,
            destination: destination.into(),
        }
    }

    /// Format and send one event. Single attempt, no retry.
    pub async fn notify(&self, event: &EnrichedEvent) -> SendResult<()> {
        let text = format_event(event);
        debug!(key = event.key(), "Sending notification");
        self.sender.send(&self.destination, &text).await
    }

    /// Send free-form text, such as the startup announcement.
    pub async fn announce(&self, text: &str) -> SendResult<()> {
        self.sender.send(&self.destination, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SendError;
    use crate::sender::MockSender;
    use lockwatch_core::{CandidateEvent, EventOrigin};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_notify_sends_formatted_text() {
        let sender = Arc::new(MockSender::new());
        let notifier = Notifier::new(sender.clone(), "-100123");

        let event = EnrichedEvent::unknown(CandidateEvent::new("sig1", EventOrigin::Signature));
        notifier.notify(&event).await.unwrap();

        let sends = sender.get_sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, "-100123");
        assert_eq!(sends[0].1, format_event(&event));
    }

    #[tokio::test]
    async fn test_notify_surfaces_failure() {
        let sender = Arc::new(MockSender::new());
        sender.set_failure(Some(SendError::Timeout("slow".to_string())));
        let notifier = Notifier::new(sender, "-100123");

        let result = notifier.announce("hello").await;
        assert!(matches!(result, Err(SendError::Timeout(_))));
    }
}

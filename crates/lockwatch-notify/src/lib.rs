//! Notification formatting and delivery.
//!
//! - `format_event`: pure, total rendering of an enriched event
//! - `MessageSender`: outbound "send text" capability (Telegram, mock)
//! - `Notifier`: formats and sends to the configured destination

pub mod error;
pub mod formatter;
pub mod notifier;
pub mod sender;
pub mod telegram;

pub use error::{SendError, SendResult};
pub use formatter::{format_event, format_startup, UNKNOWN};
pub use notifier::Notifier;
pub use sender::{DynMessageSender, MessageSender, MockSender};
pub use telegram::TelegramSender;

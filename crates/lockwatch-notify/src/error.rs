//! Send error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("Send timed out: {0}")]
    Timeout(String),

    #[error("Message rejected ({status}): {description}")]
    Rejected { status: u16, description: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl SendError {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Rejected { .. } => "rejected",
            Self::Transport(_) => "transport",
        }
    }
}

impl From<reqwest::Error> for SendError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL carries the bot token.
        let e = e.without_url();
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

pub type SendResult<T> = Result<T, SendError>;

//! Telegram Bot API sender.

use crate::error::{SendError, SendResult};
use crate::sender::MessageSender;
use lockwatch_core::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default Bot API base.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Default timeout for `sendMessage`.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

/// Sends messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramSender {
    client: Client,
    api_base: String,
    token: String,
}

impl std::fmt::Debug for TelegramSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSender")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramSender {
    /// Create a sender.
    ///
    /// # Arguments
    /// * `api_base` - Bot API base URL (e.g., "https://api.telegram.org")
    /// * `token` - Bot token
    /// * `timeout` - Per-send timeout
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> SendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SendError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn send_message(&self, chat_id: &str, text: &str) -> SendResult<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let request = SendMessageRequest {
            chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        interpret_response(status, &body)?;
        debug!("Message delivered");
        Ok(())
    }
}

impl MessageSender for TelegramSender {
    fn send<'a>(&'a self, destination: &'a str, text: &'a str) -> BoxFuture<'a, SendResult<()>> {
        Box::pin(self.send_message(destination, text))
    }
}

/// Map a Bot API response to a send result.
fn interpret_response(status: u16, body: &[u8]) -> SendResult<()> {
    match serde_json::from_slice::<ApiResponse>(body) {
        Ok(response) if response.ok && (200..300).contains(&status) => Ok(()),
        Ok(response) => Err(SendError::Rejected {
            status: response.error_code.unwrap_or(status),
            description: response
                .description
                .unwrap_or_else(|| "no description".to_string()),
        }),
        Err(_) => Err(SendError::Rejected {
            status,
            description: String::from_utf8_lossy(body).chars().take(256).collect(),
        }),
    }
}

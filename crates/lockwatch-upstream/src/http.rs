//! Shared HTTP transport.
//!
//! Owns the `reqwest` client (with its request timeout) and the outbound
//! rate limiter. Each upstream client wraps one of these.

use crate::error::{UpstreamError, UpstreamResult};
use crate::rate_limiter::RateLimiter;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default timeout for upstream requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum number of body bytes kept in a `Status` error.
const MAX_ERROR_BODY: usize = 256;

/// HTTP client plus outbound rate limiter.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    limiter: Arc<RateLimiter>,
}

impl HttpTransport {
    /// Create a transport with the given request timeout.
    pub fn new(timeout: Duration, limiter: Arc<RateLimiter>) -> UpstreamResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lockwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                UpstreamError::HttpClient(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, limiter })
    }

    /// Create a transport with the default timeout and rate limit.
    pub fn with_defaults() -> UpstreamResult<Self> {
        Self::new(DEFAULT_TIMEOUT, Arc::new(RateLimiter::default()))
    }

    /// Shared rate limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// GET a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> UpstreamResult<T> {
        self.execute(self.client.get(url), url)
            .await?
            .ok_or_else(|| UpstreamError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                body: String::new(),
            })
    }

    /// GET a JSON document, mapping HTTP 404 to `None`.
    pub async fn get_json_optional<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> UpstreamResult<Option<T>> {
        self.execute(self.client.get(url), url).await
    }

    /// POST a JSON body and parse the JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> UpstreamResult<T> {
        self.execute(self.client.post(url).json(body), url)
            .await?
            .ok_or_else(|| UpstreamError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                body: String::new(),
            })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> UpstreamResult<Option<T>> {
        let _permit = self.limiter.acquire().await;

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(%url, "Upstream returned 404");
            return Ok(None);
        }

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let parsed = serde_json::from_slice(&bytes)?;
        Ok(Some(parsed))
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

//! Upstream error types.

use thiserror::Error;

/// Failure of a single upstream call.
///
/// Everything except `HttpClient` is transient. Persistent failures are
/// logged at error level by the scheduler.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl UpstreamError {
    /// Check if the failure is worth retrying on a later cycle.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::HttpClient(_))
    }

    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "status",
            Self::Malformed(_) => "malformed",
            Self::Rpc { .. } => "rpc",
            Self::Transport(_) => "transport",
            Self::HttpClient(_) => "client",
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(UpstreamError::Timeout("t".into()).is_transient());
        assert!(UpstreamError::Status {
            status: 500,
            body: String::new()
        }
        .is_transient());
        assert!(UpstreamError::Malformed("x".into()).is_transient());
        assert!(!UpstreamError::HttpClient("tls".into()).is_transient());
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err: UpstreamError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.label(), "malformed");
    }
}

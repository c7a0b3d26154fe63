//! Discovery error types.

use lockwatch_upstream::UpstreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("{strategy} discovery upstream failure: {error}")]
    Upstream {
        strategy: &'static str,
        #[source]
        error: UpstreamError,
    },

    #[error("All discovery strategies failed: {0}")]
    AllFailed(String),
}

impl DiscoveryError {
    /// Wrap an upstream failure for the given strategy.
    pub fn upstream(strategy: &'static str, error: UpstreamError) -> Self {
        Self::Upstream { strategy, error }
    }

    /// Whether retrying after a backoff can succeed. A composite failure
    /// counts as transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Upstream { error, .. } => error.is_transient(),
            Self::AllFailed(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_follows_upstream() {
        let timeout = DiscoveryError::upstream("signature", UpstreamError::Timeout("t".to_string()));
        assert!(timeout.is_transient());

        let client = DiscoveryError::upstream("registry", UpstreamError::HttpClient("tls".to_string()));
        assert!(!client.is_transient());

        assert!(DiscoveryError::AllFailed("a; b".to_string()).is_transient());
    }
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

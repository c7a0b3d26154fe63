//! Pump.fun coin client.
//!
//! Secondary market-cap source: `{base}/coins/{mint}`.

use crate::error::UpstreamResult;
use crate::http::HttpTransport;
use serde::Deserialize;
use tracing::instrument;

/// Default public API base.
pub const DEFAULT_BASE_URL: &str = "https://frontend-api-v3.pump.fun";

/// Coin record as returned by the coins endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PumpCoin {
    #[serde(default)]
    pub mint: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub usd_market_cap: Option<f64>,
    /// Market cap in SOL.
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Supply in base units.
    #[serde(default)]
    pub total_supply: Option<u64>,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub created_timestamp: Option<i64>,
}

/// Client for the Pump.fun coins endpoint.
pub struct PumpFunClient {
    transport: HttpTransport,
    base_url: String,
}

impl PumpFunClient {
    /// Create a new client.
    pub fn new(base_url: impl Into<String>, transport: HttpTransport) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a coin. Unknown mints (HTTP 404) yield `None`.
    #[instrument(skip(self))]
    pub async fn coin(&self, mint: &str) -> UpstreamResult<Option<PumpCoin>> {
        let url = format!("{}/coins/{}", self.base_url, mint);
        self.transport.get_json_optional(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coin_parsing() {
        let coin: PumpCoin = serde_json::from_value(json!({
            "mint": "MintA",
            "name": "Alpha",
            "symbol": "ALP",
            "usd_market_cap": 1234.5,
            "market_cap": 8.1,
            "total_supply": 1000000000000000u64,
            "created_timestamp": 1700000000000i64,
            "complete": false
        }))
        .unwrap();

        assert_eq!(coin.usd_market_cap, Some(1234.5));
        assert_eq!(coin.created_timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn test_coin_sparse() {
        let coin: PumpCoin = serde_json::from_value(json!({"mint": "MintA"})).unwrap();
        assert!(coin.name.is_none());
        assert!(coin.usd_market_cap.is_none());
    }
}

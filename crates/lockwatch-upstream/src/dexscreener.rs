//! DexScreener token-pairs client.
//!
//! Primary source for token name, symbol and market capitalization.
//!
//! Endpoint: `{base}/token-pairs/v1/solana/{mint}`, returns an array of
//! trading pairs for the token.

use crate::error::UpstreamResult;
use crate::http::HttpTransport;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Default public API base.
pub const DEFAULT_BASE_URL: &str = "https://api.dexscreener.com";

/// Token side of a pair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DexToken {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

/// Pool liquidity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DexLiquidity {
    #[serde(default)]
    pub usd: Option<f64>,
}

/// One trading pair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    #[serde(default)]
    pub pair_address: String,
    pub base_token: DexToken,
    pub quote_token: DexToken,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Fully diluted valuation.
    #[serde(default)]
    pub fdv: Option<f64>,
    /// Pair creation time, epoch milliseconds.
    #[serde(default)]
    pub pair_created_at: Option<i64>,
    #[serde(default)]
    pub liquidity: Option<DexLiquidity>,
}

impl DexPair {
    fn liquidity_usd(&self) -> f64 {
        self.liquidity
            .as_ref()
            .and_then(|l| l.usd)
            .unwrap_or(0.0)
    }
}

/// Client for the DexScreener API.
pub struct DexScreenerClient {
    transport: HttpTransport,
    base_url: String,
}

impl DexScreenerClient {
    /// Create a new client.
    pub fn new(base_url: impl Into<String>, transport: HttpTransport) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch all pairs for a mint. Unknown tokens yield an empty list.
    #[instrument(skip(self))]
    pub async fn token_pairs(&self, mint: &str) -> UpstreamResult<Vec<DexPair>> {
        let url = format!("{}/token-pairs/v1/solana/{}", self.base_url, mint);
        let pairs: Option<Vec<DexPair>> = self.transport.get_json_optional(&url).await?;
        let pairs = pairs.unwrap_or_default();
        debug!(count = pairs.len(), "Fetched DexScreener pairs");
        Ok(pairs)
    }
}

/// Pick the most liquid pair whose base token is `mint`.
pub fn best_pair<'a>(pairs: &'a [DexPair], mint: &str) -> Option<&'a DexPair> {
    pairs
        .iter()
        .filter(|p| p.base_token.address == mint)
        .max_by(|a, b| a.liquidity_usd().total_cmp(&b.liquidity_usd()))
}

//! Metadata sources.

use chrono::{DateTime, Utc};
use lockwatch_core::{from_epoch, BoxFuture};
use lockwatch_upstream::{
    best_pair, DexScreenerClient, PumpFunClient, RpcClient, UpstreamResult,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Partial token metadata returned by one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSnapshot {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub market_cap_usd: Option<Decimal>,
    /// Total supply in UI units.
    pub total_supply: Option<Decimal>,
    pub decimals: Option<u8>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TokenSnapshot {
    /// Fill unset fields from `other`.
    ///
    /// Empty strings and zero or negative numbers count as unset, so a
    /// later source can still provide them.
    pub fn absorb(&mut self, other: TokenSnapshot) {
        fill_text(&mut self.name, other.name);
        fill_text(&mut self.symbol, other.symbol);
        fill_positive(&mut self.market_cap_usd, other.market_cap_usd);
        if self.total_supply.is_none() && other.total_supply.is_some_and(|s| s > Decimal::ZERO) {
            self.total_supply = other.total_supply;
            self.decimals = other.decimals.or(self.decimals);
        }
        if self.decimals.is_none() {
            self.decimals = other.decimals;
        }
        if self.created_at.is_none() {
            self.created_at = other.created_at;
        }
    }

    /// Check if every field is set.
    pub fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.symbol.is_some()
            && self.market_cap_usd.is_some()
            && self.total_supply.is_some()
            && self.decimals.is_some()
            && self.created_at.is_some()
    }
}

fn fill_text(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
    }
}

fn fill_positive(slot: &mut Option<Decimal>, value: Option<Decimal>) {
    if slot.is_none() {
        *slot = value.filter(|v| *v > Decimal::ZERO);
    }
}

fn decimal_from_f64(value: Option<f64>) -> Option<Decimal> {
    value
        .filter(|v| v.is_finite())
        .and_then(|v| Decimal::try_from(v).ok())
}

/// A provider of token metadata for a mint.
pub trait MetadataSource: Send + Sync {
    /// Source name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Fetch what this source knows about `mint`.
    fn fetch<'a>(&'a self, mint: &'a str) -> BoxFuture<'a, UpstreamResult<TokenSnapshot>>;
}

/// Total supply and decimals from `getTokenSupply`.
pub struct RpcSupplySource {
    rpc: Arc<RpcClient>,
}

impl RpcSupplySource {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }
}

impl MetadataSource for RpcSupplySource {
    fn name(&self) -> &'static str {
        "rpc_supply"
    }

    fn fetch<'a>(&'a self, mint: &'a str) -> BoxFuture<'a, UpstreamResult<TokenSnapshot>> {
        Box::pin(async move {
            let supply = self.rpc.get_token_supply(mint).await?;
            Ok(TokenSnapshot {
                total_supply: Some(supply.ui_amount),
                decimals: Some(supply.decimals),
                ..Default::default()
            })
        })
    }
}

/// Name, symbol, market cap and pair creation time from DexScreener.
pub struct DexScreenerSource {
    client: Arc<DexScreenerClient>,
}

impl DexScreenerSource {
    pub fn new(client: Arc<DexScreenerClient>) -> Self {
        Self { client }
    }
}

impl MetadataSource for DexScreenerSource {
    fn name(&self) -> &'static str {
        "dexscreener"
    }

    fn fetch<'a>(&'a self, mint: &'a str) -> BoxFuture<'a, UpstreamResult<TokenSnapshot>> {
        Box::pin(async move {
            let pairs = self.client.token_pairs(mint).await?;
            let Some(pair) = best_pair(&pairs, mint) else {
                return Ok(TokenSnapshot::default());
            };

            let market_cap = decimal_from_f64(pair.market_cap)
                .filter(|v| *v > Decimal::ZERO)
                .or_else(|| decimal_from_f64(pair.fdv));

            Ok(TokenSnapshot {
                name: Some(pair.base_token.name.clone()),
                symbol: Some(pair.base_token.symbol.clone()),
                market_cap_usd: market_cap,
                created_at: pair.pair_created_at.and_then(from_epoch),
                ..Default::default()
            })
        })
    }
}

/// Name, symbol, USD market cap and creation time from Pump.fun.
pub struct PumpFunSource {
    client: Arc<PumpFunClient>,
}

impl PumpFunSource {
    pub fn new(client: Arc<PumpFunClient>) -> Self {
        Self { client }
    }
}

impl MetadataSource for PumpFunSource {
    fn name(&self) -> &'static str {
        "pumpfun"
    }

    fn fetch<'a>(&'a self, mint: &'a str) -> BoxFuture<'a, UpstreamResult<TokenSnapshot>> {
        Box::pin(async move {
            let Some(coin) = self.client.coin(mint).await? else {
                return Ok(TokenSnapshot::default());
            };

            Ok(TokenSnapshot {
                name: coin.name,
                symbol: coin.symbol,
                market_cap_usd: decimal_from_f64(coin.usd_market_cap),
                created_at: coin.created_timestamp.and_then(from_epoch),
                ..Default::default()
            })
        })
    }
}

//! Upstream clients for lockwatch.
//!
//! Stateless request/response wrappers around the data sources a poll
//! cycle reads from:
//! - Chain JSON-RPC (signature listing, transactions, token supply)
//! - DexScreener token pairs (primary metadata and market cap)
//! - Pump.fun coin endpoint (secondary market cap)
//! - Lock-registry listing
//!
//! Every call has a timeout and passes through a shared outbound rate
//! limiter. Clients never retry; retry policy belongs to the scheduler.

pub mod dexscreener;
pub mod error;
pub mod http;
pub mod pumpfun;
pub mod rate_limiter;
pub mod registry;
pub mod rpc;

pub use dexscreener::{best_pair, DexLiquidity, DexPair, DexScreenerClient, DexToken};
pub use error::{UpstreamError, UpstreamResult};
pub use http::HttpTransport;
pub use pumpfun::{PumpCoin, PumpFunClient};
pub use rate_limiter::{RateLimiter, RatePermit};
pub use registry::RegistryClient;
pub use rpc::{EpochInfo, RpcClient, SignatureInfo, SignaturesQuery, TokenSupply};

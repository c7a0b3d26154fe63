//! Token metadata enrichment.
//!
//! Resolves name, symbol, market cap, supply and creation time for the
//! mint of a candidate event by walking a fixed list of metadata sources.
//! Missing data never fails enrichment; the field stays unknown.

pub mod enricher;
pub mod source;

pub use enricher::Enricher;
pub use source::{DexScreenerSource, MetadataSource, PumpFunSource, RpcSupplySource, TokenSnapshot};

//! Chain JSON-RPC client.
//!
//! Covers the handful of methods the monitor needs: signature listing for
//! the lock program, transaction fetch, token supply and epoch info.

use crate::error::{UpstreamError, UpstreamResult};
use crate::http::HttpTransport;
use lockwatch_core::parse_decimal;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument};

/// Maximum page size accepted by `getSignaturesForAddress`.
pub const MAX_SIGNATURE_LIMIT: usize = 1000;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// One entry of a `getSignaturesForAddress` page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(default)]
    pub slot: u64,
    /// Non-null when the transaction failed on chain.
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

impl SignatureInfo {
    /// Check if the transaction failed on chain.
    pub fn is_failed(&self) -> bool {
        self.err.as_ref().is_some_and(|e| !e.is_null())
    }
}

/// Pagination parameters for `getSignaturesForAddress`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignaturesQuery {
    /// Start searching backwards from this signature.
    pub before: Option<String>,
    /// Stop at this signature (exclusive).
    pub until: Option<String>,
    /// Page size, clamped to `1..=1000`.
    pub limit: usize,
}

/// Parsed `getTokenSupply` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSupply {
    /// Supply in base units.
    pub amount: Decimal,
    pub decimals: u8,
    /// Supply in UI units.
    pub ui_amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct RpcContextValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenAmount {
    amount: String,
    decimals: u8,
    #[serde(default)]
    ui_amount_string: Option<String>,
}

/// Parsed `getEpochInfo` result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochInfo {
    pub epoch: u64,
    #[serde(default)]
    pub slot_index: u64,
    #[serde(default)]
    pub slots_in_epoch: u64,
    #[serde(default)]
    pub absolute_slot: u64,
}

/// JSON-RPC client for the chain endpoint.
pub struct RpcClient {
    transport: HttpTransport,
    /// RPC endpoint URL.
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a new RPC client.
    ///
    /// # Arguments
    /// * `url` - JSON-RPC endpoint (e.g., "https://api.mainnet-beta.solana.com")
    /// * `transport` - Shared HTTP transport
    pub fn new(url: impl Into<String>, transport: HttpTransport) -> Self {
        Self {
            transport,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one JSON-RPC call.
    ///
    /// Returns `Ok(None)` for a `null` result. A JSON-RPC error object
    /// becomes `UpstreamError::Rpc`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> UpstreamResult<Option<T>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response: RpcResponse<T> = self.transport.post_json(&self.url, &request).await?;

        if let Some(error) = response.error {
            return Err(UpstreamError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result)
    }

    /// List recent signatures involving `address`, newest first.
    #[instrument(skip(self, query))]
    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        query: &SignaturesQuery,
    ) -> UpstreamResult<Vec<SignatureInfo>> {
        let mut options = serde_json::Map::new();
        options.insert(
            "limit".to_string(),
            json!(query.limit.clamp(1, MAX_SIGNATURE_LIMIT)),
        );
        if let Some(before) = &query.before {
            options.insert("before".to_string(), json!(before));
        }
        if let Some(until) = &query.until {
            options.insert("until".to_string(), json!(until));
        }

        let page: Vec<SignatureInfo> = self
            .call("getSignaturesForAddress", json!([address, options]))
            .await?
            .ok_or_else(|| {
                UpstreamError::Malformed("getSignaturesForAddress returned null".to_string())
            })?;

        debug!(count = page.len(), "Fetched signature page");
        Ok(page)
    }

    /// Fetch a transaction in `jsonParsed` encoding.
    ///
    /// Returns `None` when the node does not (yet) know the transaction.
    #[instrument(skip(self))]
    pub async fn get_transaction(
        &self,
        signature: &str,
    ) -> UpstreamResult<Option<serde_json::Value>> {
        let tx: Option<serde_json::Value> = self
            .call(
                "getTransaction",
                json!([
                    signature,
                    {
                        "encoding": "jsonParsed",
                        "maxSupportedTransactionVersion": 0,
                        "commitment": "confirmed"
                    }
                ]),
            )
            .await?;

        Ok(tx.filter(|v| !v.is_null()))
    }

    /// Fetch the total supply of a mint.
    #[instrument(skip(self))]
    pub async fn get_token_supply(&self, mint: &str) -> UpstreamResult<TokenSupply> {
        let raw: RpcContextValue<RawTokenAmount> = self
            .call("getTokenSupply", json!([mint]))
            .await?
            .ok_or_else(|| UpstreamError::Malformed("getTokenSupply returned null".to_string()))?;

        parse_token_amount(raw.value)
    }

    /// Fetch current epoch information.
    pub async fn get_epoch_info(&self) -> UpstreamResult<EpochInfo> {
        self.call("getEpochInfo", json!([]))
            .await?
            .ok_or_else(|| UpstreamError::Malformed("getEpochInfo returned null".to_string()))
    }
}

fn parse_token_amount(raw: RawTokenAmount) -> UpstreamResult<TokenSupply> {
    let amount = parse_decimal(&json!(raw.amount))
        .map_err(|e| UpstreamError::Malformed(format!("token amount: {e}")))?;

    let ui_amount = match raw.ui_amount_string.as_deref() {
        Some(s) => parse_decimal(&json!(s))
            .map_err(|e| UpstreamError::Malformed(format!("token ui amount: {e}")))?,
        None => {
            let decimals = u32::from(raw.decimals);
            if decimals > 28 {
                return Err(UpstreamError::Malformed(format!(
                    "unsupported decimals {decimals}"
                )));
            }
            amount * Decimal::new(1, decimals)
        }
    };

    Ok(TokenSupply {
        amount,
        decimals: raw.decimals,
        ui_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rpc_request_serialization() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "getEpochInfo",
            params: json!([]),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"jsonrpc":"2.0","id":1,"method":"getEpochInfo","params":[]}"#
        );
    }

    #[test]
    fn test_signature_info_parsing() {
        let page: Vec<SignatureInfo> = serde_json::from_value(json!([
            {"signature": "sigA", "slot": 10, "err": null, "blockTime": 1700000000, "confirmationStatus": "finalized"},
            {"signature": "sigB", "slot": 9, "err": {"InstructionError": [0, "Custom"]}}
        ]))
        .unwrap();

        assert_eq!(page[0].signature, "sigA");
        assert_eq!(page[0].block_time, Some(1_700_000_000));
        assert!(!page[0].is_failed());
        assert!(page[1].is_failed());
    }

    #[test]
    fn test_rpc_error_object() {
        let response: RpcResponse<serde_json::Value> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32602, "message": "Invalid param"}
        }))
        .unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[test]
    fn test_parse_token_amount() {
        let supply = parse_token_amount(RawTokenAmount {
            amount: "1000000000000000".to_string(),
            decimals: 6,
            ui_amount_string: Some("1000000000".to_string()),
        })
        .unwrap();
        assert_eq!(supply.ui_amount, dec!(1000000000));

        let supply = parse_token_amount(RawTokenAmount {
            amount: "2500".to_string(),
            decimals: 2,
            ui_amount_string: None,
        })
        .unwrap();
        assert_eq!(supply.ui_amount, dec!(25));
    }
}

//! Mint resolution for lock transactions.
//!
//! Two strategies, tried in order:
//!
//! 1. [`token_balance_mint`]: the mint whose token account balance grew the
//!    most during the transaction. High confidence.
//! 2. [`first_writable_non_signer`]: the first account key that is writable
//!    and not a signer. This is a positional guess; for some instruction
//!    layouts it lands on an escrow or metadata account instead of the
//!    mint. Callers see it labelled `MintConfidence::Heuristic`.

use lockwatch_core::{parse_decimal, MintConfidence};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;

/// One account key with its signer and writable flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKey {
    pub pubkey: String,
    pub signer: bool,
    pub writable: bool,
}

/// A resolved mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintResolution {
    pub mint: String,
    pub confidence: MintConfidence,
    /// Largest positive balance change of the mint, UI units.
    pub delta: Option<Decimal>,
}

/// Read the account keys of a transaction.
///
/// Accepts `jsonParsed` objects (`{pubkey, signer, writable}`) and plain
/// string keys, whose flags are derived from the message header. Addresses
/// loaded through lookup tables (`meta.loadedAddresses`) are appended for
/// string-encoded messages; `jsonParsed` already lists them.
pub fn account_keys(tx: &Value) -> Vec<AccountKey> {
    let message = &tx["transaction"]["message"];
    let Some(raw_keys) = message["accountKeys"].as_array() else {
        return Vec::new();
    };

    let header = &message["header"];
    let num_signers = header_count(header, "numRequiredSignatures");
    let ro_signed = header_count(header, "numReadonlySignedAccounts");
    let ro_unsigned = header_count(header, "numReadonlyUnsignedAccounts");
    let total = raw_keys.len();

    let mut keys: Vec<AccountKey> = raw_keys
        .iter()
        .enumerate()
        .filter_map(|(index, key)| match key {
            Value::String(pubkey) => {
                let signer = index < num_signers;
                let writable = if signer {
                    index < num_signers.saturating_sub(ro_signed)
                } else {
                    index < total.saturating_sub(ro_unsigned)
                };
                Some(AccountKey {
                    pubkey: pubkey.clone(),
                    signer,
                    writable,
                })
            }
            Value::Object(map) => Some(AccountKey {
                pubkey: map.get("pubkey")?.as_str()?.to_string(),
                signer: map.get("signer").and_then(Value::as_bool).unwrap_or(false),
                writable: map.get("writable").and_then(Value::as_bool).unwrap_or(false),
            }),
            _ => None,
        })
        .collect();

    if raw_keys.first().is_some_and(Value::is_string) {
        let loaded = &tx["meta"]["loadedAddresses"];
        for (field, writable) in [("writable", true), ("readonly", false)] {
            if let Some(list) = loaded[field].as_array() {
                keys.extend(list.iter().filter_map(Value::as_str).map(|pubkey| AccountKey {
                    pubkey: pubkey.to_string(),
                    signer: false,
                    writable,
                }));
            }
        }
    }

    keys
}

fn header_count(header: &Value, field: &str) -> usize {
    header[field]
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

/// Mint with the largest positive token balance change, and that change.
pub fn token_balance_mint(tx: &Value) -> Option<(String, Decimal)> {
    balance_deltas(&tx["meta"])
        .into_iter()
        .filter(|(_, delta)| *delta > Decimal::ZERO)
        .max_by(|a, b| a.1.cmp(&b.1))
}

/// First writable, non-signer account key.
pub fn first_writable_non_signer(keys: &[AccountKey]) -> Option<&str> {
    keys.iter()
        .find(|k| k.writable && !k.signer)
        .map(|k| k.pubkey.as_str())
}

/// Resolve the mint with the strongest strategy that yields one.
pub fn resolve_mint(tx: &Value, keys: &[AccountKey]) -> Option<MintResolution> {
    if let Some((mint, delta)) = token_balance_mint(tx) {
        return Some(MintResolution {
            mint,
            confidence: MintConfidence::High,
            delta: Some(delta),
        });
    }

    first_writable_non_signer(keys).map(|mint| MintResolution {
        mint: mint.to_string(),
        confidence: MintConfidence::Heuristic,
        delta: None,
    })
}

/// Per token account balance change `(mint, post - pre)`, UI units.
fn balance_deltas(meta: &Value) -> Vec<(String, Decimal)> {
    let mut pre: HashMap<u64, Decimal> = HashMap::new();
    if let Some(balances) = meta["preTokenBalances"].as_array() {
        for balance in balances {
            if let (Some(index), Some(amount)) =
                (balance["accountIndex"].as_u64(), ui_amount(balance))
            {
                pre.insert(index, amount);
            }
        }
    }

    let Some(post) = meta["postTokenBalances"].as_array() else {
        return Vec::new();
    };

    post.iter()
        .filter_map(|balance| {
            let index = balance["accountIndex"].as_u64()?;
            let mint = balance["mint"].as_str().filter(|m| !m.is_empty())?;
            let after = ui_amount(balance)?;
            let before = pre.get(&index).copied().unwrap_or(Decimal::ZERO);
            Some((mint.to_string(), after.checked_sub(before)?))
        })
        .collect()
}

fn ui_amount(balance: &Value) -> Option<Decimal> {
    let token_amount = &balance["uiTokenAmount"];
    if let Some(ui) = token_amount.get("uiAmountString") {
        if let Ok(value) = parse_decimal(ui) {
            return Some(value);
        }
    }

    let amount = parse_decimal(token_amount.get("amount")?).ok()?;
    let decimals = u32::try_from(token_amount.get("decimals")?.as_u64()?).ok()?;
    if decimals > 28 {
        return None;
    }
    amount.checked_mul(Decimal::new(1, decimals))
}

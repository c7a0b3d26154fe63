//! Shared builders for integration tests.

use lockwatch_bot::{AppConfig, Application};
use lockwatch_detector::{PUMPFUN_PROGRAM_ID, STREAMFLOW_PROGRAM_ID};
use lockwatch_notify::MockSender;
use serde_json::{json, Value};
use std::sync::Arc;

/// Config pointing every upstream at `base_url`.
pub fn config(base_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.rpc.url = format!("{base_url}/rpc");
    config.metadata.dexscreener_url = base_url.to_string();
    config.metadata.pumpfun_url = base_url.to_string();
    config.http.max_requests = 1000;
    config.http.max_inflight = 16;
    config.detector.backlog_on_start = true;
    config.telegram.token = "123:test".to_string();
    config.telegram.chat_id = "-100123".to_string();
    config
}

/// Application wired to a mock sender.
pub fn app(config: AppConfig) -> (Application, Arc<MockSender>) {
    let sender = Arc::new(MockSender::new());
    let app = Application::with_sender(config, sender.clone()).unwrap();
    (app, sender)
}

/// One `getSignaturesForAddress` entry.
pub fn signature(sig: &str) -> Value {
    json!({
        "signature": sig,
        "slot": 250000000u64,
        "err": null,
        "blockTime": 1700000000,
        "confirmationStatus": "confirmed"
    })
}

/// A successful lock transaction whose mint is visible in token balances.
pub fn lock_tx(sig: &str, mint: &str) -> Value {
    json!({
        "slot": 250000000u64,
        "blockTime": 1700000000,
        "meta": {
            "err": null,
            "preTokenBalances": [],
            "postTokenBalances": [
                {"accountIndex": 2, "mint": mint, "uiTokenAmount": {"amount": "5000000000", "decimals": 6, "uiAmountString": "5000"}}
            ]
        },
        "transaction": {
            "signatures": [sig],
            "message": {"accountKeys": [
                {"pubkey": "Payer", "signer": true, "writable": true},
                {"pubkey": mint, "signer": false, "writable": true},
                {"pubkey": "Escrow", "signer": false, "writable": true},
                {"pubkey": STREAMFLOW_PROGRAM_ID, "signer": false, "writable": false},
                {"pubkey": PUMPFUN_PROGRAM_ID, "signer": false, "writable": false}
            ]}
        }
    })
}

/// A lock transaction without token balances: only the positional guess
/// applies, and it lands on an escrow account.
pub fn heuristic_lock_tx(sig: &str) -> Value {
    json!({
        "slot": 250000001u64,
        "blockTime": 1700000000,
        "meta": {"err": null},
        "transaction": {
            "signatures": [sig],
            "message": {"accountKeys": [
                {"pubkey": "Payer", "signer": true, "writable": true},
                {"pubkey": "EscrowNotAMint", "signer": false, "writable": true},
                {"pubkey": STREAMFLOW_PROGRAM_ID, "signer": false, "writable": false},
                {"pubkey": PUMPFUN_PROGRAM_ID, "signer": false, "writable": false}
            ]}
        }
    })
}

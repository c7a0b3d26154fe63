//! Raw record to candidate event extraction.
//!
//! Extraction is pure: no I/O, no clock, no errors. A record that cannot
//! be interpreted as a lock event yields `None`.

use crate::config::DetectorConfig;
use crate::mint::{account_keys, resolve_mint};
use lockwatch_core::{
    normalize_timestamp, parse_decimal, AmountBasis, CandidateEvent, EventOrigin, LockAmount,
    MintConfidence, RawRecord, RecordKind,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::trace;

/// Fields probed for a registry entry's amount, in order.
const AMOUNT_FIELDS: [&str; 2] = ["depositedAmount", "amount"];
/// Fields probed for a registry entry's creation time, in order.
const CREATED_FIELDS: [&str; 3] = ["createdAt", "created_at", "start"];

/// Turns raw records into candidate lock events.
#[derive(Debug, Clone)]
pub struct EventExtractor {
    lock_program: String,
    required_programs: Vec<String>,
    min_confidence: MintConfidence,
}

impl EventExtractor {
    /// Create an extractor from detector configuration.
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            lock_program: config.lock_program.clone(),
            required_programs: config.required_programs.clone(),
            min_confidence: config.min_mint_confidence,
        }
    }

    /// Interpret a raw record, or reject it with `None`.
    pub fn extract(&self, record: &RawRecord) -> Option<CandidateEvent> {
        let candidate = match record.kind {
            RecordKind::Transaction => self.extract_transaction(record),
            RecordKind::LockEntry => extract_lock_entry(record),
        };

        if candidate.is_none() {
            trace!(source_id = %record.source_id, kind = %record.kind, "Record rejected");
        }
        candidate
    }

    fn extract_transaction(&self, record: &RawRecord) -> Option<CandidateEvent> {
        let tx = &record.payload;
        if tx.is_null() {
            return None;
        }

        let meta = tx.get("meta").filter(|m| !m.is_null())?;
        if meta.get("err").is_some_and(|e| !e.is_null()) {
            return None;
        }

        let keys = account_keys(tx);
        if !keys.iter().any(|k| k.pubkey == self.lock_program) {
            return None;
        }
        if !self.required_programs.is_empty()
            && !keys
                .iter()
                .any(|k| self.required_programs.iter().any(|p| *p == k.pubkey))
        {
            return None;
        }

        let resolution = resolve_mint(tx, &keys)?;
        if resolution.confidence < self.min_confidence {
            return None;
        }

        let key = tx["transaction"]["signatures"][0]
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or(record.source_id.as_str());
        if key.is_empty() {
            return None;
        }

        let mut candidate = CandidateEvent::new(key, EventOrigin::Signature);
        candidate.mint = Some(resolution.mint);
        candidate.mint_confidence = Some(resolution.confidence);
        candidate.raw_amount = resolution
            .delta
            .map(|delta| LockAmount::ui(delta, AmountBasis::BalanceDeltaEstimate));
        candidate.created_at = tx.get("blockTime").and_then(normalize_timestamp);
        Some(candidate)
    }
}

fn extract_lock_entry(record: &RawRecord) -> Option<CandidateEvent> {
    let entry = record.payload.as_object()?;

    let key = entry.get("id").and_then(entry_id)?;
    let mint = entry
        .get("mint")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())?;

    let mut candidate = CandidateEvent::new(key, EventOrigin::Registry);
    candidate.mint = Some(mint.to_string());
    candidate.mint_confidence = Some(MintConfidence::High);
    candidate.raw_amount = AMOUNT_FIELDS
        .iter()
        .find_map(|field| entry.get(*field))
        .and_then(|value| parse_decimal(value).ok())
        .filter(|value| *value > Decimal::ZERO)
        .map(|value| {
            let amount = LockAmount::base_units(value, AmountBasis::RegistryReported);
            let decimals = entry
                .get("decimals")
                .and_then(Value::as_u64)
                .and_then(|d| u8::try_from(d).ok());
            match decimals.and_then(|d| amount.to_ui(Some(d))) {
                Some(ui) => LockAmount::ui(ui, AmountBasis::RegistryReported),
                None => amount,
            }
        });
    candidate.created_at = CREATED_FIELDS
        .iter()
        .filter_map(|field| entry.get(*field))
        .find_map(normalize_timestamp);
    Some(candidate)
}

/// Registry entry id as a string. Numeric ids are accepted.
pub fn entry_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PUMPFUN_PROGRAM_ID, STREAMFLOW_PROGRAM_ID};
    use chrono::{TimeZone, Utc};
    use lockwatch_core::AmountScale;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn lock_tx(signature: &str) -> Value {
        json!({
            "slot": 250000000u64,
            "blockTime": 1700000000,
            "meta": {
                "err": null,
                "preTokenBalances": [],
                "postTokenBalances": [
                    {"accountIndex": 2, "mint": "MintA", "uiTokenAmount": {"amount": "5000000", "decimals": 6, "uiAmountString": "5"}}
                ]
            },
            "transaction": {
                "signatures": [signature],
                "message": {"accountKeys": [
                    {"pubkey": "Payer", "signer": true, "writable": true},
                    {"pubkey": "MintA", "signer": false, "writable": true},
                    {"pubkey": "Escrow", "signer": false, "writable": true},
                    {"pubkey": STREAMFLOW_PROGRAM_ID, "signer": false, "writable": false},
                    {"pubkey": PUMPFUN_PROGRAM_ID, "signer": false, "writable": false}
                ]}
            }
        })
    }

    fn extractor() -> EventExtractor {
        EventExtractor::new(&DetectorConfig::default())
    }

    #[test]
    fn test_extract_known_good_transaction() {
        let record = RawRecord::transaction("sig1", lock_tx("sig1"));
        let candidate = extractor().extract(&record).unwrap();

        assert_eq!(candidate.key, "sig1");
        assert_eq!(candidate.origin, EventOrigin::Signature);
        assert_eq!(candidate.mint.as_deref(), Some("MintA"));
        assert_eq!(candidate.mint_confidence, Some(MintConfidence::High));
        let amount = candidate.raw_amount.unwrap();
        assert_eq!(amount.value, dec!(5));
        assert!(amount.is_estimate());
        assert_eq!(
            candidate.created_at,
            Some(Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap())
        );
    }

    #[test]
    fn test_extract_is_idempotent() {
        let record = RawRecord::transaction("sig1", lock_tx("sig1"));
        let extractor = extractor();
        assert_eq!(extractor.extract(&record), extractor.extract(&record));
    }

    #[test]
    fn test_reject_null_and_failed() {
        let extractor = extractor();
        assert!(extractor
            .extract(&RawRecord::transaction("sig1", Value::Null))
            .is_none());

        let mut tx = lock_tx("sig1");
        tx["meta"] = Value::Null;
        assert!(extractor.extract(&RawRecord::transaction("sig1", tx)).is_none());

        let mut tx = lock_tx("sig1");
        tx["meta"]["err"] = json!({"InstructionError": [0, "Custom"]});
        assert!(extractor.extract(&RawRecord::transaction("sig1", tx)).is_none());
    }

    #[test]
    fn test_reject_without_lock_program() {
        let mut tx = lock_tx("sig1");
        tx["transaction"]["message"]["accountKeys"][3]["pubkey"] = json!("OtherProgram");
        assert!(extractor().extract(&RawRecord::transaction("sig1", tx)).is_none());
    }

    #[test]
    fn test_required_programs() {
        let mut tx = lock_tx("sig1");
        tx["transaction"]["message"]["accountKeys"]
            .as_array_mut()
            .unwrap()
            .pop();
        assert!(extractor()
            .extract(&RawRecord::transaction("sig1", tx.clone()))
            .is_none());

        let any_token = EventExtractor::new(&DetectorConfig {
            required_programs: Vec::new(),
            ..Default::default()
        });
        assert!(any_token.extract(&RawRecord::transaction("sig1", tx)).is_some());
    }

    #[test]
    fn test_heuristic_mint_and_min_confidence() {
        let mut tx = lock_tx("sig1");
        tx["meta"]["postTokenBalances"] = json!([]);

        let candidate = extractor()
            .extract(&RawRecord::transaction("sig1", tx.clone()))
            .unwrap();
        assert_eq!(candidate.mint.as_deref(), Some("MintA"));
        assert_eq!(candidate.mint_confidence, Some(MintConfidence::Heuristic));
        assert!(candidate.raw_amount.is_none());

        let strict = EventExtractor::new(&DetectorConfig {
            min_mint_confidence: MintConfidence::High,
            ..Default::default()
        });
        assert!(strict.extract(&RawRecord::transaction("sig1", tx)).is_none());
    }

    #[test]
    fn test_key_falls_back_to_source_id() {
        let mut tx = lock_tx("sig1");
        tx["transaction"]["signatures"] = json!([]);
        let candidate = extractor()
            .extract(&RawRecord::transaction("fallback", tx))
            .unwrap();
        assert_eq!(candidate.key, "fallback");
    }

    #[test]
    fn test_extract_lock_entry() {
        let record = RawRecord::lock_entry(
            "lock-1",
            json!({
                "id": "lock-1",
                "mint": "MintA",
                "depositedAmount": "2500000000",
                "decimals": 6,
                "createdAt": 1700000000000i64
            }),
        );
        let candidate = extractor().extract(&record).unwrap();

        assert_eq!(candidate.key, "lock-1");
        assert_eq!(candidate.origin, EventOrigin::Registry);
        let amount = candidate.raw_amount.unwrap();
        assert_eq!(amount.value, dec!(2500));
        assert_eq!(amount.scale, AmountScale::Ui);
        assert!(!amount.is_estimate());
        assert_eq!(
            candidate.created_at,
            Some(Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap())
        );
    }

    #[test]
    fn test_lock_entry_without_decimals_stays_in_base_units() {
        let record = RawRecord::lock_entry(
            "7",
            json!({"id": 7, "mint": "MintA", "amount": 1000, "start": "2023-11-14T22:13:20Z"}),
        );
        let candidate = extractor().extract(&record).unwrap();
        assert_eq!(candidate.key, "7");
        assert_eq!(candidate.raw_amount.unwrap().scale, AmountScale::BaseUnits);
        assert!(candidate.created_at.is_some());
    }

    #[test]
    fn test_reject_incomplete_lock_entry() {
        let extractor = extractor();
        assert!(extractor
            .extract(&RawRecord::lock_entry("x", json!({"mint": "MintA"})))
            .is_none());
        assert!(extractor
            .extract(&RawRecord::lock_entry("x", json!({"id": "x", "mint": ""})))
            .is_none());
        assert!(extractor
            .extract(&RawRecord::lock_entry("x", json!(["not", "an", "object"])))
            .is_none());
    }
}

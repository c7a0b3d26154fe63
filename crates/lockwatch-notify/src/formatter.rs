//! Message rendering.
//!
//! Rendering is total: every missing field prints as "unknown".

use lockwatch_core::{
    format_percent, format_token_amount, format_usd, AmountScale, EnrichedEvent, EventOrigin,
    MintConfidence,
};
use std::fmt::Write;

/// Placeholder for unresolved fields.
pub const UNKNOWN: &str = "unknown";

/// Transaction explorer base.
const SOLSCAN_TX_URL: &str = "https://solscan.io/tx/";

/// Render an enriched event as a notification message.
pub fn format_event(event: &EnrichedEvent) -> String {
    let candidate = &event.candidate;
    let mut text = String::with_capacity(512);

    text.push_str("🔒 New token lock detected\n\n");

    let name = event.name.as_deref().unwrap_or(UNKNOWN);
    match event.symbol.as_deref() {
        Some(symbol) => {
            let _ = writeln!(text, "💎 {name} ({symbol})");
        }
        None => {
            let _ = writeln!(text, "💎 {name}");
        }
    }

    let mint = candidate.mint.as_deref().unwrap_or(UNKNOWN);
    let mint_note = match candidate.mint_confidence {
        Some(MintConfidence::Heuristic) => " (guessed from account order)",
        _ => "",
    };
    let _ = writeln!(text, "🪙 Mint: {mint}{mint_note}");

    let market_cap = event
        .market_cap_usd
        .map(format_usd)
        .unwrap_or_else(|| UNKNOWN.to_string());
    let _ = writeln!(text, "💰 Market cap: {market_cap}");

    let _ = writeln!(text, "🔐 Locked: {}", locked_line(event));

    let age = match event.age_days {
        Some(1) => "1 day".to_string(),
        Some(days) => format!("{days} days"),
        None => UNKNOWN.to_string(),
    };
    let _ = writeln!(text, "🕒 Age: {age}");

    match candidate.origin {
        EventOrigin::Signature => {
            let _ = write!(text, "🔗 Transaction: {SOLSCAN_TX_URL}{}", candidate.key);
        }
        EventOrigin::Registry => {
            let _ = write!(text, "🆔 Lock: {}", candidate.key);
        }
    }

    text
}

fn locked_line(event: &EnrichedEvent) -> String {
    let amount = match (event.locked_amount, event.candidate.raw_amount) {
        (Some(ui), _) => format_token_amount(ui),
        (None, Some(raw)) if raw.scale == AmountScale::BaseUnits => {
            format!("{} base units", format_token_amount(raw.value))
        }
        _ => return UNKNOWN.to_string(),
    };

    let percent = event
        .locked_percent
        .map(format_percent)
        .unwrap_or_else(|| format!("{UNKNOWN} % of supply"));
    let estimate = if event.amount_is_estimate() {
        " (estimate)"
    } else {
        ""
    };

    format!("{amount} ({percent}){estimate}")
}

/// Render the startup announcement.
pub fn format_startup(lock_program: &str) -> String {
    format!("✅ lockwatch started, monitoring lock program {lock_program}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lockwatch_core::{AmountBasis, CandidateEvent, LockAmount};
    use rust_decimal_macros::dec;

    fn candidate() -> CandidateEvent {
        let mut candidate = CandidateEvent::new("5sigABC", EventOrigin::Signature);
        candidate.mint = Some("MintA".to_string());
        candidate.mint_confidence = Some(MintConfidence::High);
        candidate.raw_amount = Some(LockAmount::ui(
            dec!(1250000),
            AmountBasis::BalanceDeltaEstimate,
        ));
        candidate.created_at = Some(Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap());
        candidate
    }

    #[test]
    fn test_format_full_event() {
        let event = EnrichedEvent {
            name: Some("Alpha".to_string()),
            symbol: Some("ALP".to_string()),
            market_cap_usd: Some(dec!(1234567.89)),
            total_supply: Some(dec!(1000000000)),
            locked_amount: Some(dec!(1250000)),
            locked_percent: Some(dec!(0.13)),
            age_days: Some(3),
            ..EnrichedEvent::unknown(candidate())
        };

        let text = format_event(&event);
        assert!(text.contains("💎 Alpha (ALP)"));
        assert!(text.contains("Mint: MintA\n"));
        assert!(text.contains("Market cap: $1,234,568"));
        assert!(text.contains("Locked: 1,250,000 (0.13%) (estimate)"));
        assert!(text.contains("Age: 3 days"));
        assert!(text.ends_with("https://solscan.io/tx/5sigABC"));
    }

    #[test]
    fn test_format_unknown_fields() {
        let mut candidate = candidate();
        candidate.mint = None;
        candidate.mint_confidence = None;
        candidate.raw_amount = None;
        let event = EnrichedEvent::unknown(candidate);

        let text = format_event(&event);
        assert!(text.contains("💎 unknown\n"));
        assert!(text.contains("Mint: unknown"));
        assert!(text.contains("Market cap: unknown"));
        assert!(text.contains("Locked: unknown"));
        assert!(text.contains("Age: unknown"));
    }

    #[test]
    fn test_format_heuristic_mint_and_missing_percent() {
        let mut candidate = candidate();
        candidate.mint_confidence = Some(MintConfidence::Heuristic);
        let event = EnrichedEvent {
            locked_amount: Some(dec!(10.5)),
            age_days: Some(1),
            ..EnrichedEvent::unknown(candidate)
        };

        let text = format_event(&event);
        assert!(text.contains("MintA (guessed from account order)"));
        assert!(text.contains("Locked: 10.5 (unknown % of supply) (estimate)"));
        assert!(text.contains("Age: 1 day\n"));
    }

    #[test]
    fn test_format_registry_event() {
        let mut candidate = CandidateEvent::new("lock-7", EventOrigin::Registry);
        candidate.mint = Some("MintB".to_string());
        candidate.mint_confidence = Some(MintConfidence::High);
        candidate.raw_amount = Some(LockAmount::base_units(
            dec!(5000),
            AmountBasis::RegistryReported,
        ));
        let event = EnrichedEvent::unknown(candidate);

        let text = format_event(&event);
        assert!(text.contains("Locked: 5,000 base units (unknown % of supply)\n"));
        assert!(!text.contains("estimate"));
        assert!(text.ends_with("🆔 Lock: lock-7"));
        assert!(!text.contains("solscan"));
    }

    #[test]
    fn test_format_startup() {
        assert!(format_startup("strm").contains("strm"));
    }
}

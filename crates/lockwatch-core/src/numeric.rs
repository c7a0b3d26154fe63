//! Decimal parsing and human-readable rendering.

use crate::error::{CoreError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a JSON number or numeric string into a `Decimal`.
pub fn parse_decimal(value: &serde_json::Value) -> Result<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Decimal::from(u))
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| CoreError::InvalidAmount(n.to_string()))?;
                Decimal::try_from(f).map_err(|_| CoreError::InvalidAmount(n.to_string()))
            }
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .map_err(CoreError::from)
        }
        other => Err(CoreError::InvalidAmount(other.to_string())),
    }
}

/// Render a USD value with thousands separators and no cents: `$1,234`.
pub fn format_usd(value: Decimal) -> String {
    let whole = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("${}", group_thousands(&whole.trunc().to_string()))
}

/// Render a token quantity with thousands separators and at most two
/// decimal places: `1,234,567.5`.
pub fn format_token_amount(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.to_string();
    match text.split_once('.') {
        Some((int_part, frac)) => format!("{}.{}", group_thousands(int_part), frac),
        None => group_thousands(&text),
    }
}

/// Render a percentage with two decimal places: `12.35%`.
pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}%")
}

fn group_thousands(int_part: &str) -> String {
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{sign}{out}")
}

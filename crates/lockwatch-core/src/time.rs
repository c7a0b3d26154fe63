//! Timestamp normalization.
//!
//! Upstreams encode creation times as epoch seconds, epoch milliseconds
//! or ISO-8601 strings. Everything is converted to `DateTime<Utc>` at the
//! boundary so age calculations use a single clock source.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Epoch values at or above this magnitude are treated as milliseconds.
///
/// 1e11 seconds is year 5138; 1e11 milliseconds is March 1973.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Source of "now" for age calculations.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Normalize a JSON timestamp in any supported encoding.
///
/// Accepts integers and floats (epoch seconds or milliseconds), numeric
/// strings, and RFC 3339 / naive ISO-8601 strings (naive values are
/// taken as UTC). Returns `None` for anything else, including zero and
/// negative epochs.
pub fn normalize_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                from_epoch(i)
            } else {
                n.as_f64().and_then(from_epoch_f64)
            }
        }
        serde_json::Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

/// Interpret an integer epoch as seconds or milliseconds by magnitude.
pub fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value <= 0 {
        return None;
    }
    if value >= MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

fn from_epoch_f64(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    if value >= MILLIS_THRESHOLD as f64 {
        DateTime::from_timestamp_millis(value as i64)
    } else {
        let secs = value.trunc() as i64;
        let nanos = ((value - value.trunc()) * 1e9) as u32;
        DateTime::from_timestamp(secs, nanos)
    }
}

/// Parse a string timestamp: numeric epoch or ISO-8601.
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return from_epoch(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return from_epoch_f64(f);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_all_encodings_agree() {
        let expected = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();

        assert_eq!(normalize_timestamp(&json!(1_700_000_000)), Some(expected));
        assert_eq!(normalize_timestamp(&json!(1_700_000_000_000i64)), Some(expected));
        assert_eq!(normalize_timestamp(&json!("1700000000")), Some(expected));
        assert_eq!(normalize_timestamp(&json!("1700000000000")), Some(expected));
        assert_eq!(
            normalize_timestamp(&json!("2023-11-14T22:13:20Z")),
            Some(expected)
        );
        assert_eq!(
            normalize_timestamp(&json!("2023-11-14T22:13:20.000+00:00")),
            Some(expected)
        );
        assert_eq!(
            normalize_timestamp(&json!("2023-11-14T22:13:20")),
            Some(expected)
        );
    }

    #[test]
    fn test_float_seconds() {
        let ts = normalize_timestamp(&json!(1_700_000_000.5)).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(normalize_timestamp(&json!(null)), None);
        assert_eq!(normalize_timestamp(&json!(0)), None);
        assert_eq!(normalize_timestamp(&json!(-5)), None);
        assert_eq!(normalize_timestamp(&json!("yesterday")), None);
        assert_eq!(normalize_timestamp(&json!("")), None);
        assert_eq!(normalize_timestamp(&json!({"ts": 1})), None);
    }

    #[test]
    fn test_fixed_clock() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(FixedClock(instant).now(), instant);
    }
}

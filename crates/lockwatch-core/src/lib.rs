//! Core domain types for the lockwatch token-lock monitor.
//!
//! This crate provides the types shared by every pipeline stage:
//! - `RawRecord`: one upstream item fetched during a poll cycle
//! - `CandidateEvent`: a record interpreted as a lock event
//! - `EnrichedEvent`: a candidate plus resolved token metadata
//! - Timestamp normalization and number rendering helpers

pub mod error;
pub mod numeric;
pub mod time;
pub mod types;

pub use error::{CoreError, Result};
pub use numeric::{format_percent, format_token_amount, format_usd, parse_decimal};
pub use time::{from_epoch, normalize_timestamp, Clock, FixedClock, SystemClock};
pub use types::{
    age_days, locked_percent, AmountBasis, AmountScale, BoxFuture, CandidateEvent,
    EnrichedEvent, EventOrigin, LockAmount, MintConfidence, RawRecord, RecordKind,
};

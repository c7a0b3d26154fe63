//! Pipeline data types.
//!
//! A poll cycle turns `RawRecord`s into `CandidateEvent`s, admits them
//! through the dedup ledger and resolves them into `EnrichedEvent`s.
//! Every derived field is optional: "unknown" is a displayable state.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future type for trait object compatibility.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Kind of upstream payload carried by a `RawRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A chain transaction (`getTransaction` result).
    Transaction,
    /// An entry from the lock-registry listing.
    LockEntry,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction => write!(f, "transaction"),
            Self::LockEntry => write!(f, "lock_entry"),
        }
    }
}

/// One item returned by an upstream source during a single poll.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Identifier unique per logical item from the source
    /// (transaction signature, lock id).
    pub source_id: String,
    /// Payload kind, selects the extraction rules.
    pub kind: RecordKind,
    /// Source-specific JSON payload.
    pub payload: serde_json::Value,
    /// When the record was fetched.
    pub observed_at: DateTime<Utc>,
}

impl RawRecord {
    /// Wrap a fetched transaction.
    pub fn transaction(signature: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            source_id: signature.into(),
            kind: RecordKind::Transaction,
            payload,
            observed_at: Utc::now(),
        }
    }

    /// Wrap a lock-registry entry.
    pub fn lock_entry(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            source_id: id.into(),
            kind: RecordKind::LockEntry,
            payload,
            observed_at: Utc::now(),
        }
    }
}

/// How the mint of a candidate was resolved.
///
/// Ordered: `Heuristic < High`, so a minimum confidence can be compared
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MintConfidence {
    /// Positional guess (first writable non-signer account). Known to be
    /// wrong for some instruction layouts.
    Heuristic,
    /// Read from token balance changes or reported directly by a registry.
    High,
}

/// Where a locked amount figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountBasis {
    /// Largest token balance increase for the mint inside the lock
    /// transaction. An estimate: fees and intermediate transfers are
    /// indistinguishable from the deposit.
    BalanceDeltaEstimate,
    /// Amount reported by the lock registry.
    RegistryReported,
}

/// Unit of a `LockAmount` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountScale {
    /// Already divided by 10^decimals.
    Ui,
    /// Smallest indivisible units; needs the mint decimals.
    BaseUnits,
}

/// A locked token quantity, always labelled with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockAmount {
    pub value: Decimal,
    pub scale: AmountScale,
    pub basis: AmountBasis,
}

impl LockAmount {
    /// Amount expressed in UI units.
    pub fn ui(value: Decimal, basis: AmountBasis) -> Self {
        Self {
            value,
            scale: AmountScale::Ui,
            basis,
        }
    }

    /// Amount expressed in base units.
    pub fn base_units(value: Decimal, basis: AmountBasis) -> Self {
        Self {
            value,
            scale: AmountScale::BaseUnits,
            basis,
        }
    }

    /// Convert to UI units.
    ///
    /// Returns `None` for base-unit amounts when the decimals are unknown
    /// or out of range.
    pub fn to_ui(&self, decimals: Option<u8>) -> Option<Decimal> {
        match self.scale {
            AmountScale::Ui => Some(self.value),
            AmountScale::BaseUnits => {
                let decimals = u32::from(decimals?);
                if decimals > 28 {
                    return None;
                }
                self.value.checked_mul(Decimal::new(1, decimals))
            }
        }
    }

    /// Check if the figure is an estimate rather than a reported value.
    pub fn is_estimate(&self) -> bool {
        self.basis == AmountBasis::BalanceDeltaEstimate
    }
}

/// Discovery strategy that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    /// Chain RPC signature listing of the lock program.
    Signature,
    /// Lock-registry listing.
    Registry,
}

impl fmt::Display for EventOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature => write!(f, "signature"),
            Self::Registry => write!(f, "registry"),
        }
    }
}

/// A raw record interpreted as a lock event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEvent {
    /// Stable dedup identity (transaction signature or lock id).
    pub key: String,
    /// Token mint, if resolved.
    pub mint: Option<String>,
    /// Confidence of the mint resolution.
    pub mint_confidence: Option<MintConfidence>,
    /// Locked quantity, if any figure could be derived.
    pub raw_amount: Option<LockAmount>,
    /// Creation instant of the lock (or its transaction).
    pub created_at: Option<DateTime<Utc>>,
    /// Discovery strategy that produced this candidate.
    pub origin: EventOrigin,
}

impl CandidateEvent {
    /// Create a candidate with only a key.
    pub fn new(key: impl Into<String>, origin: EventOrigin) -> Self {
        Self {
            key: key.into(),
            mint: None,
            mint_confidence: None,
            raw_amount: None,
            created_at: None,
            origin,
        }
    }
}

/// A candidate with resolved metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    pub candidate: CandidateEvent,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub market_cap_usd: Option<Decimal>,
    pub total_supply: Option<Decimal>,
    /// Locked amount in UI units.
    pub locked_amount: Option<Decimal>,
    /// `locked_amount / total_supply * 100`, rounded to 2 decimal places.
    pub locked_percent: Option<Decimal>,
    /// Whole days between enrichment time and `created_at`.
    pub age_days: Option<i64>,
}

impl EnrichedEvent {
    /// An enriched event with every metadata field unknown.
    pub fn unknown(candidate: CandidateEvent) -> Self {
        Self {
            candidate,
            name: None,
            symbol: None,
            market_cap_usd: None,
            total_supply: None,
            locked_amount: None,
            locked_percent: None,
            age_days: None,
        }
    }

    /// Dedup key of the underlying candidate.
    pub fn key(&self) -> &str {
        &self.candidate.key
    }

    /// Check if the locked amount is a labelled estimate.
    pub fn amount_is_estimate(&self) -> bool {
        self.candidate
            .raw_amount
            .map(|a| a.is_estimate())
            .unwrap_or(false)
    }
}

/// Locked share of supply as a percentage, rounded to 2 decimal places.
///
/// Returns `None` when either side is unknown, the supply is zero or
/// negative, or the arithmetic overflows.
pub fn locked_percent(locked: Option<Decimal>, total_supply: Option<Decimal>) -> Option<Decimal> {
    let locked = locked?;
    let supply = total_supply?;
    if supply <= Decimal::ZERO {
        return None;
    }
    let pct = locked.checked_div(supply)?.checked_mul(Decimal::ONE_HUNDRED)?;
    Some(pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Whole days elapsed since `created_at`.
///
/// Instants in the future (clock skew between upstreams) count as 0 days.
pub fn age_days(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    let created_at = created_at?;
    Some((now - created_at).num_days().max(0))
}

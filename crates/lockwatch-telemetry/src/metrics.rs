//! Prometheus metrics for lockwatch.
//!
//! Covers poll cycles, discovered records, candidate admission,
//! enrichment gaps and notification delivery.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. Registration only fails on
//! duplicate metric names, a startup-time programming error.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_int_gauge, CounterVec, Histogram,
    IntGauge,
};

/// Completed poll cycles.
/// Labels: outcome (clean/failed)
pub static CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lockwatch_cycles_total",
        "Total completed poll cycles",
        &["outcome"]
    )
    .unwrap()
});

/// Poll cycle duration in milliseconds.
pub static CYCLE_DURATION_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "lockwatch_cycle_duration_ms",
        "Poll cycle duration in milliseconds",
        vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0]
    )
    .unwrap()
});

/// Raw records returned by discovery.
pub static RECORDS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lockwatch_records_total",
        "Total raw records returned by discovery",
        &["strategy"]
    )
    .unwrap()
});

/// Candidate outcomes.
/// Labels: result (admitted/duplicate/rejected)
pub static CANDIDATES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lockwatch_candidates_total",
        "Total extracted candidates by admission result",
        &["result"]
    )
    .unwrap()
});

/// Metadata source failures during enrichment.
pub static ENRICHMENT_GAPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lockwatch_enrichment_gaps_total",
        "Total metadata source failures during enrichment",
        &["source", "kind"]
    )
    .unwrap()
});

/// Notification sends.
/// Labels: result (sent, or the send error label)
pub static NOTIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lockwatch_notifications_total",
        "Total notification send attempts",
        &["result"]
    )
    .unwrap()
});

/// Size of the dedup ledger.
pub static LEDGER_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("lockwatch_ledger_size", "Number of admitted event keys").unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a completed cycle.
    pub fn cycle_completed(outcome: &str, duration_ms: f64) {
        CYCLES_TOTAL.with_label_values(&[outcome]).inc();
        CYCLE_DURATION_MS.observe(duration_ms);
    }

    /// Record records returned by a discovery strategy.
    pub fn records_discovered(strategy: &str, count: usize) {
        RECORDS_TOTAL
            .with_label_values(&[strategy])
            .inc_by(count as f64);
    }

    /// Record a candidate admission result.
    pub fn candidate(result: &str) {
        CANDIDATES_TOTAL.with_label_values(&[result]).inc();
    }

    /// Record a metadata source failure.
    pub fn enrichment_gap(source: &str, kind: &str) {
        ENRICHMENT_GAPS_TOTAL
            .with_label_values(&[source, kind])
            .inc();
    }

    /// Record a notification send result.
    pub fn notification(result: &str) {
        NOTIFICATIONS_TOTAL.with_label_values(&[result]).inc();
    }

    /// Set the dedup ledger size.
    pub fn ledger_size(size: usize) {
        LEDGER_SIZE.set(i64::try_from(size).unwrap_or(i64::MAX));
    }
}

//! Run statistics summary.
//!
//! Process-local counters kept by the scheduler, logged periodically and
//! at shutdown.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Counters for one process run.
#[derive(Debug)]
pub struct RunStats {
    started_at: DateTime<Utc>,
    cycles: AtomicU64,
    failed_cycles: AtomicU64,
    records: AtomicU64,
    rejected: AtomicU64,
    admitted: AtomicU64,
    duplicates: AtomicU64,
    notified: AtomicU64,
    send_failures: AtomicU64,
}

/// Point-in-time copy of `RunStats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub cycles: u64,
    pub failed_cycles: u64,
    pub records: u64,
    pub rejected: u64,
    pub admitted: u64,
    pub duplicates: u64,
    pub notified: u64,
    pub send_failures: u64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            cycles: AtomicU64::new(0),
            failed_cycles: AtomicU64::new(0),
            records: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            admitted: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            notified: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
        }
    }

    pub fn record_cycle(&self, failed: bool) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_cycles.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_records(&self, count: usize) {
        self.records.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send(&self, ok: bool) {
        if ok {
            self.notified.fetch_add(1, Ordering::Relaxed);
        } else {
            self.send_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> RunStatsSnapshot {
        RunStatsSnapshot {
            started_at: self.started_at,
            cycles: self.cycles.load(Ordering::Relaxed),
            failed_cycles: self.failed_cycles.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            notified: self.notified.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }

    /// Log a summary of the run so far.
    pub fn output_summary(&self) {
        let s = self.snapshot();
        let uptime_hours = (Utc::now() - s.started_at).num_minutes() as f64 / 60.0;

        info!("========== Run Statistics Summary ==========");
        info!(
            started_at = %s.started_at,
            uptime_hours = format!("{:.1}", uptime_hours),
            "Run"
        );
        info!(
            cycles = s.cycles,
            failed_cycles = s.failed_cycles,
            records = s.records,
            "Polling"
        );
        info!(
            admitted = s.admitted,
            duplicates = s.duplicates,
            rejected = s.rejected,
            "Candidates"
        );
        info!(
            notified = s.notified,
            send_failures = s.send_failures,
            "Notifications"
        );
        info!("============================================");
    }

    /// Snapshot as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

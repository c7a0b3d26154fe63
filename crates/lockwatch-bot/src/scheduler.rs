//! Poll loop.
//!
//! One cycle: discover raw records, extract candidates, admit them through
//! the dedup ledger, then enrich and notify the admitted ones with bounded
//! parallelism. A clean cycle sleeps `poll_interval`, a failed one
//! `error_backoff`.
//!
//! Admission happens before enrichment, so a key is sent at most once even
//! if enrichment or delivery fails afterwards.

use crate::error::CycleError;
use futures_util::{stream, FutureExt, StreamExt};
use lockwatch_core::CandidateEvent;
use lockwatch_detector::{DedupLedger, Discovery, EventExtractor};
use lockwatch_enricher::Enricher;
use lockwatch_notify::Notifier;
use lockwatch_telemetry::{Metrics, RunStats};
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Poll loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Sleep after a clean cycle (seconds).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Sleep after a failed cycle (seconds).
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,

    /// Admitted candidates enriched and sent concurrently.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Run statistics summary interval (seconds).
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_error_backoff_secs() -> u64 {
    60
}

fn default_max_concurrency() -> usize {
    4
}

fn default_stats_interval_secs() -> u64 {
    3600
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            error_backoff_secs: default_error_backoff_secs(),
            max_concurrency: default_max_concurrency(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

/// Counts for one completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub records: usize,
    pub rejected: usize,
    pub admitted: usize,
    pub duplicates: usize,
    pub notified: usize,
    pub send_failures: usize,
}

/// Drives discovery, extraction, admission, enrichment and notification.
pub struct Scheduler {
    discovery: Arc<dyn Discovery>,
    extractor: EventExtractor,
    ledger: Arc<DedupLedger>,
    enricher: Arc<Enricher>,
    notifier: Notifier,
    config: SchedulerConfig,
    stats: Arc<RunStats>,
    /// Effective delays, `with_delays` overrides the configured seconds.
    poll_interval: Duration,
    error_backoff: Duration,
}

impl Scheduler {
    pub fn new(
        discovery: Arc<dyn Discovery>,
        extractor: EventExtractor,
        ledger: Arc<DedupLedger>,
        enricher: Arc<Enricher>,
        notifier: Notifier,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            error_backoff: config.error_backoff(),
            discovery,
            extractor,
            ledger,
            enricher,
            notifier,
            config,
            stats: Arc::new(RunStats::new()),
        }
    }

    /// Override the clean and failed cycle delays.
    pub fn with_delays(mut self, poll_interval: Duration, error_backoff: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.error_backoff = error_backoff;
        self
    }

    /// Dedup ledger shared with this scheduler.
    pub fn ledger(&self) -> &Arc<DedupLedger> {
        &self.ledger
    }

    /// Run statistics.
    pub fn stats(&self) -> &Arc<RunStats> {
        &self.stats
    }

    /// Delay before the next cycle given this cycle's result.
    pub fn delay_after(&self, result: &Result<CycleReport, CycleError>) -> Duration {
        match result {
            Ok(_) => self.poll_interval,
            Err(_) => self.error_backoff,
        }
    }

    /// Poll until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            discovery = self.discovery.name(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            error_backoff_ms = self.error_backoff.as_millis() as u64,
            max_concurrency = self.config.max_concurrency,
            "Entering poll loop"
        );

        let stats_interval = self.config.stats_interval();
        let mut last_stats_output = Instant::now();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let cycle_id = Uuid::new_v4();
            let span = info_span!("cycle", %cycle_id);
            let started = Instant::now();

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(%cycle_id, "Cycle aborted by shutdown");
                    break;
                }
                result = self.run_cycle().instrument(span) => result,
            };

            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            let delay = self.delay_after(&result);
            match &result {
                Ok(report) => {
                    Metrics::cycle_completed("clean", elapsed_ms);
                    debug!(%cycle_id, ?report, "Cycle clean");
                }
                Err(e) if e.is_transient() => {
                    Metrics::cycle_completed("failed", elapsed_ms);
                    warn!(
                        %cycle_id,
                        error = %e,
                        backoff_ms = delay.as_millis() as u64,
                        "Cycle failed, backing off"
                    );
                }
                Err(e) => {
                    Metrics::cycle_completed("failed", elapsed_ms);
                    error!(
                        %cycle_id,
                        error = %e,
                        backoff_ms = delay.as_millis() as u64,
                        "Cycle failed with a persistent error, backing off"
                    );
                }
            }
            self.stats.record_cycle(result.is_err());

            if last_stats_output.elapsed() >= stats_interval {
                self.stats.output_summary();
                last_stats_output = Instant::now();
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.stats.output_summary();
        info!(stats = %self.stats.to_json(), "Poll loop stopped");
    }

    /// Run one cycle. A panic inside the cycle is reported as
    /// `CycleError::Panicked`.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        match AssertUnwindSafe(self.cycle()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(CycleError::Panicked(message))
            }
        }
    }

    async fn cycle(&self) -> Result<CycleReport, CycleError> {
        let records = self.discovery.fetch_candidates().await?;

        let mut report = CycleReport {
            records: records.len(),
            ..Default::default()
        };
        Metrics::records_discovered(self.discovery.name(), records.len());
        self.stats.record_records(records.len());

        let mut admitted: Vec<CandidateEvent> = Vec::new();
        for record in &records {
            let Some(candidate) = self.extractor.extract(record) else {
                report.rejected += 1;
                self.stats.record_rejected();
                Metrics::candidate("rejected");
                continue;
            };

            if self.ledger.admit(&candidate.key) {
                report.admitted += 1;
                self.stats.record_admitted();
                Metrics::candidate("admitted");
                admitted.push(candidate);
            } else {
                report.duplicates += 1;
                self.stats.record_duplicate();
                Metrics::candidate("duplicate");
                debug!(key = %candidate.key, "Duplicate event skipped");
            }
        }
        Metrics::ledger_size(self.ledger.len());

        let outcomes: Vec<bool> = stream::iter(admitted)
            .map(|candidate| self.deliver(candidate))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        report.notified = outcomes.iter().filter(|ok| **ok).count();
        report.send_failures = outcomes.len() - report.notified;
        Ok(report)
    }

    async fn deliver(&self, candidate: CandidateEvent) -> bool {
        let event = self.enricher.enrich(candidate).await;

        match self.notifier.notify(&event).await {
            Ok(()) => {
                info!(
                    key = event.key(),
                    mint = ?event.candidate.mint,
                    name = ?event.name,
                    "Lock event notified"
                );
                Metrics::notification("sent");
                self.stats.record_send(true);
                true
            }
            Err(e) => {
                warn!(key = event.key(), error = %e, "Notification failed, not retrying");
                Metrics::notification(e.label());
                self.stats.record_send(false);
                false
            }
        }
    }
}

//! Prometheus metrics, structured logging and run statistics for lockwatch.
//!
//! - Prometheus counters for cycles, candidates, enrichment gaps and sends
//! - Structured logging with tracing (JSON in production)
//! - Periodic run statistics summary

pub mod error;
pub mod logging;
pub mod metrics;
pub mod run_stats;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use run_stats::{RunStats, RunStatsSnapshot};

//! lockwatch token-lock monitor.
//!
//! Wires the pipeline together:
//! - Discovery of lock transactions and registry entries
//! - Extraction and deduplication of lock events
//! - Metadata enrichment
//! - Telegram notification

pub mod app;
pub mod config;
pub mod error;
pub mod scheduler;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult, CycleError};
pub use scheduler::{CycleReport, Scheduler, SchedulerConfig};

//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preflight error: {0}")]
    Preflight(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] lockwatch_upstream::UpstreamError),

    #[error("Notify error: {0}")]
    Notify(#[from] lockwatch_notify::SendError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] lockwatch_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// Why a poll cycle failed.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Discovery failed: {0}")]
    Discovery(#[from] lockwatch_detector::DiscoveryError),

    #[error("Cycle panicked: {0}")]
    Panicked(String),
}

impl CycleError {
    /// Whether the next cycle can be expected to recover. A panic is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Discovery(e) => e.is_transient(),
            Self::Panicked(_) => false,
        }
    }
}

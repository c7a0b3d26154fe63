//! Application configuration.
//!
//! Loaded from a TOML file, then overlaid with environment variables:
//! `TELEGRAM_TOKEN`, `TELEGRAM_CHAT_ID`, `RPC_URL`, `POLL_INTERVAL_SECS`.

use crate::error::{AppError, AppResult};
use crate::scheduler::SchedulerConfig;
use lockwatch_detector::DetectorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config path used when neither `--config` nor `LOCKWATCH_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Chain RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
        }
    }
}

/// Outbound HTTP settings shared by every upstream client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Requests allowed per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Rate limit window (milliseconds).
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Requests in flight at once.
    #[serde(default = "default_max_inflight")]
    pub max_inflight: u32,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_ms() -> u64 {
    1000
}

fn default_max_inflight() -> u32 {
    4
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            max_inflight: default_max_inflight(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Metadata source endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_dexscreener_url")]
    pub dexscreener_url: String,
    #[serde(default = "default_pumpfun_url")]
    pub pumpfun_url: String,
    /// Source order. Known names: `rpc_supply`, `dexscreener`, `pumpfun`.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
}

fn default_dexscreener_url() -> String {
    lockwatch_upstream::dexscreener::DEFAULT_BASE_URL.to_string()
}

fn default_pumpfun_url() -> String {
    lockwatch_upstream::pumpfun::DEFAULT_BASE_URL.to_string()
}

fn default_sources() -> Vec<String> {
    vec![
        "rpc_supply".to_string(),
        "dexscreener".to_string(),
        "pumpfun".to_string(),
    ]
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            dexscreener_url: default_dexscreener_url(),
            pumpfun_url: default_pumpfun_url(),
            sources: default_sources(),
        }
    }
}

/// Telegram destination. Credentials come from the environment.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default)]
    pub chat_id: String,
    /// Per-send timeout (seconds).
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
    /// Send a message once the preflight passes.
    #[serde(default = "default_true")]
    pub startup_message: bool,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_base", &self.api_base)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("chat_id", &self.chat_id)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .field("startup_message", &self.startup_message)
            .finish()
    }
}

fn default_api_base() -> String {
    lockwatch_notify::telegram::DEFAULT_API_BASE.to_string()
}

fn default_send_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: String::new(),
            chat_id: String::new(),
            send_timeout_secs: default_send_timeout_secs(),
            startup_message: true,
        }
    }
}

impl TelegramConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl AppConfig {
    /// Load configuration: file, then environment, then validation.
    ///
    /// Path precedence: `path` argument, `LOCKWATCH_CONFIG`, then
    /// `config/default.toml`. A missing file yields defaults.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let config_path = path
            .map(str::to_string)
            .or_else(|| std::env::var("LOCKWATCH_CONFIG").ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse TOML content.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Overlay environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("TELEGRAM_TOKEN") {
            self.telegram.token = token.trim().to_string();
        }
        if let Some(chat_id) = non_empty("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = chat_id.trim().to_string();
        }
        if let Some(url) = non_empty("RPC_URL") {
            self.rpc.url = url.trim().to_string();
        }
        if let Some(secs) = non_empty("POLL_INTERVAL_SECS") {
            self.scheduler.poll_interval_secs = secs.trim().parse().map_err(|e| {
                AppError::Config(format!("POLL_INTERVAL_SECS must be an integer: {e}"))
            })?;
        }
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> AppResult<()> {
        if self.telegram.token.is_empty() {
            return Err(AppError::Config("TELEGRAM_TOKEN is not set".to_string()));
        }
        if self.telegram.chat_id.is_empty() {
            return Err(AppError::Config("TELEGRAM_CHAT_ID is not set".to_string()));
        }
        if self.rpc.url.trim().is_empty() {
            return Err(AppError::Config("rpc.url must not be empty".to_string()));
        }
        if self.scheduler.poll_interval_secs == 0 || self.scheduler.error_backoff_secs == 0 {
            return Err(AppError::Config(
                "poll_interval_secs and error_backoff_secs must be positive".to_string(),
            ));
        }
        if self.scheduler.stats_interval_secs == 0 {
            return Err(AppError::Config(
                "stats_interval_secs must be positive".to_string(),
            ));
        }
        if self.scheduler.max_concurrency == 0 {
            return Err(AppError::Config(
                "max_concurrency must be positive".to_string(),
            ));
        }
        if self.http.timeout_secs == 0
            || self.http.max_requests == 0
            || self.http.window_ms == 0
            || self.http.max_inflight == 0
        {
            return Err(AppError::Config(
                "http limits and timeout must be positive".to_string(),
            ));
        }
        if self.telegram.send_timeout_secs == 0 {
            return Err(AppError::Config(
                "telegram.send_timeout_secs must be positive".to_string(),
            ));
        }
        for source in &self.metadata.sources {
            if !matches!(source.as_str(), "rpc_supply" | "dexscreener" | "pumpfun") {
                return Err(AppError::Config(format!(
                    "unknown metadata source: {source}"
                )));
            }
        }
        self.detector.validate().map_err(AppError::Config)
    }
}

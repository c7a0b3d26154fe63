//! Detector configuration.

use lockwatch_core::MintConfidence;
use serde::{Deserialize, Serialize};

/// Streamflow token-lock program.
pub const STREAMFLOW_PROGRAM_ID: &str = "strmRqUCoQUgGUan5YhzUZa6KqdzwX5L6FpUxfmKg5m";

/// Pump.fun bonding-curve program.
pub const PUMPFUN_PROGRAM_ID: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

/// Configuration for discovery and extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Lock program whose transactions are watched.
    #[serde(default = "default_lock_program")]
    pub lock_program: String,

    /// When non-empty, at least one of these programs must appear in a
    /// transaction for it to be reported. Defaults to Pump.fun; an empty
    /// list reports every lock.
    #[serde(default = "default_required_programs")]
    pub required_programs: Vec<String>,

    /// Minimum mint confidence for a transaction to be reported.
    #[serde(default = "default_min_mint_confidence")]
    pub min_mint_confidence: MintConfidence,

    /// Page size for `getSignaturesForAddress`.
    #[serde(default = "default_signature_page_limit")]
    pub signature_page_limit: usize,

    /// Pages walked back per cycle when a signature page comes back full.
    #[serde(default = "default_max_signature_pages")]
    pub max_signature_pages: usize,

    /// Concurrent `getTransaction` calls within one page.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Report what already exists at startup (first signature page, first
    /// registry listing) instead of only seeding the cursors.
    #[serde(default)]
    pub backlog_on_start: bool,

    /// Lock-registry listing URL. Registry discovery is enabled when set.
    #[serde(default)]
    pub registry_url: Option<String>,

    /// Entries requested from the registry per cycle.
    #[serde(default = "default_registry_page_limit")]
    pub registry_page_limit: usize,

    /// Signature discovery can be switched off to run registry-only.
    #[serde(default = "default_true")]
    pub signature_discovery: bool,
}

fn default_lock_program() -> String {
    STREAMFLOW_PROGRAM_ID.to_string()
}

fn default_required_programs() -> Vec<String> {
    vec![PUMPFUN_PROGRAM_ID.to_string()]
}

fn default_min_mint_confidence() -> MintConfidence {
    MintConfidence::Heuristic
}

fn default_signature_page_limit() -> usize {
    50
}

fn default_max_signature_pages() -> usize {
    10
}

fn default_fetch_concurrency() -> usize {
    4
}

fn default_registry_page_limit() -> usize {
    50
}

fn default_true() -> bool {
    true
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            lock_program: default_lock_program(),
            required_programs: default_required_programs(),
            min_mint_confidence: default_min_mint_confidence(),
            signature_page_limit: default_signature_page_limit(),
            max_signature_pages: default_max_signature_pages(),
            fetch_concurrency: default_fetch_concurrency(),
            backlog_on_start: false,
            registry_url: None,
            registry_page_limit: default_registry_page_limit(),
            signature_discovery: true,
        }
    }
}

impl DetectorConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.lock_program.trim().is_empty() {
            return Err("lock_program must not be empty".to_string());
        }
        if self.signature_page_limit == 0 {
            return Err("signature_page_limit must be positive".to_string());
        }
        if self.max_signature_pages == 0 {
            return Err("max_signature_pages must be positive".to_string());
        }
        if self.fetch_concurrency == 0 {
            return Err("fetch_concurrency must be positive".to_string());
        }
        if self.registry_page_limit == 0 {
            return Err("registry_page_limit must be positive".to_string());
        }
        if !self.signature_discovery && self.registry_url.is_none() {
            return Err("no discovery strategy enabled".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lock_program, STREAMFLOW_PROGRAM_ID);
        assert_eq!(config.required_programs, vec![PUMPFUN_PROGRAM_ID.to_string()]);
        assert_eq!(config.max_signature_pages, 10);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DetectorConfig =
            from_json(r#"{"required_programs": [], "min_mint_confidence": "high"}"#);
        assert!(config.required_programs.is_empty());
        assert_eq!(config.min_mint_confidence, MintConfidence::High);
        assert_eq!(config.signature_page_limit, 50);
        assert!(config.signature_discovery);
    }

    #[test]
    fn test_validation_failures() {
        let config = DetectorConfig {
            lock_program: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            signature_discovery: false,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            signature_discovery: false,
            registry_url: Some("http://localhost/locks".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    fn from_json(json: &str) -> DetectorConfig {
        serde_json::from_str(json).unwrap()
    }
}

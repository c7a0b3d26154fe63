//! Lock event discovery, extraction and deduplication.
//!
//! - `Discovery` strategies fetch raw records each poll cycle
//! - `EventExtractor` turns a raw record into a `CandidateEvent` or
//!   rejects it
//! - `DedupLedger` admits each event key exactly once per process

pub mod config;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod ledger;
pub mod mint;

pub use config::{DetectorConfig, PUMPFUN_PROGRAM_ID, STREAMFLOW_PROGRAM_ID};
pub use discovery::{
    BoxFuture, CompositeDiscovery, Discovery, RegistryDiscovery, SignatureDiscovery,
};
pub use error::{DiscoveryError, DiscoveryResult};
pub use extractor::EventExtractor;
pub use ledger::DedupLedger;
pub use mint::{AccountKey, MintResolution};

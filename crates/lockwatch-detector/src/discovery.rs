//! Pluggable discovery strategies.
//!
//! A `Discovery` produces the raw records of one poll cycle. Strategies
//! are selected at composition time:
//!
//! - `SignatureDiscovery` lists lock-program signatures over RPC and
//!   fetches each transaction.
//! - `RegistryDiscovery` reads a lock-registry listing.
//! - `CompositeDiscovery` runs several strategies and fails only when all
//!   of them fail.

use crate::config::DetectorConfig;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::extractor::entry_id;
use futures_util::stream::{self, StreamExt};
use lockwatch_core::RawRecord;
use lockwatch_upstream::{RegistryClient, RpcClient, SignatureInfo, SignaturesQuery};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use lockwatch_core::BoxFuture;

/// Source of raw records for a poll cycle.
pub trait Discovery: Send + Sync {
    /// Strategy name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Fetch the records of one cycle.
    fn fetch_candidates(&self) -> BoxFuture<'_, DiscoveryResult<Vec<RawRecord>>>;
}

/// Cursor state of `SignatureDiscovery`.
#[derive(Debug, Default)]
struct CursorState {
    /// Newest signature of the last fully fetched page.
    until: Option<String>,
    /// Whether the first page was seen.
    primed: bool,
}

/// Signature listing of the lock program plus per-signature transaction
/// fetch.
///
/// A full page is followed by older pages (`before` the oldest listed,
/// same `until`) up to `max_signature_pages`. The `until` cursor advances
/// to the newest listed signature only when every transaction listed in
/// the cycle was fetched. Otherwise the page is listed
/// again next cycle and the dedup ledger drops what was already reported.
pub struct SignatureDiscovery {
    rpc: Arc<RpcClient>,
    program: String,
    page_limit: usize,
    max_pages: usize,
    fetch_concurrency: usize,
    backlog_on_start: bool,
    cursor: Mutex<CursorState>,
}

impl SignatureDiscovery {
    pub fn new(rpc: Arc<RpcClient>, config: &DetectorConfig) -> Self {
        Self {
            rpc,
            program: config.lock_program.clone(),
            page_limit: config.signature_page_limit,
            max_pages: config.max_signature_pages.max(1),
            fetch_concurrency: config.fetch_concurrency.max(1),
            backlog_on_start: config.backlog_on_start,
            cursor: Mutex::new(CursorState::default()),
        }
    }

    async fn list_page(&self, query: &SignaturesQuery) -> DiscoveryResult<Vec<SignatureInfo>> {
        self.rpc
            .get_signatures_for_address(&self.program, query)
            .await
            .map_err(|e| DiscoveryError::upstream(self.name(), e))
    }

    /// Current `until` cursor.
    pub fn cursor(&self) -> Option<String> {
        self.cursor.lock().until.clone()
    }

    async fn fetch(&self) -> DiscoveryResult<Vec<RawRecord>> {
        let (until, primed) = {
            let state = self.cursor.lock();
            (state.until.clone(), state.primed)
        };

        let query = SignaturesQuery {
            before: None,
            until: until.clone(),
            limit: self.page_limit,
        };
        let mut page = self.list_page(&query).await?;
        let newest = page.first().map(|info| info.signature.clone());

        if !primed && !self.backlog_on_start {
            let mut state = self.cursor.lock();
            state.primed = true;
            if newest.is_some() {
                state.until = newest;
            }
            info!(
                skipped = page.len(),
                cursor = ?state.until,
                "Signature cursor seeded, existing locks not reported"
            );
            return Ok(Vec::new());
        }

        // Walk back until a short page closes the gap to the cursor.
        let mut last_len = page.len();
        let mut pages = 1;
        while last_len >= self.page_limit && pages < self.max_pages {
            let query = SignaturesQuery {
                before: page.last().map(|info| info.signature.clone()),
                until: until.clone(),
                limit: self.page_limit,
            };
            let older = self.list_page(&query).await?;
            last_len = older.len();
            pages += 1;
            page.extend(older);
        }

        if last_len >= self.page_limit {
            warn!(
                limit = self.page_limit,
                pages,
                "Signature page cap reached, older signatures skipped"
            );
        }

        // Oldest first, so notifications follow chain order.
        let pending: Vec<SignatureInfo> = page
            .into_iter()
            .rev()
            .filter(|info| {
                if info.is_failed() {
                    debug!(signature = %info.signature, "Skipping failed transaction");
                }
                !info.is_failed()
            })
            .collect();

        let fetched: Vec<(String, Option<serde_json::Value>)> = stream::iter(pending)
            .map(|info| async move {
                match self.rpc.get_transaction(&info.signature).await {
                    Ok(tx) => (info.signature, tx),
                    Err(e) => {
                        warn!(
                            signature = %info.signature,
                            error = %e,
                            "Transaction fetch failed, retrying next cycle"
                        );
                        (info.signature, None)
                    }
                }
            })
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        let mut complete = true;
        let mut records = Vec::with_capacity(fetched.len());
        for (signature, tx) in fetched {
            match tx {
                Some(tx) => records.push(RawRecord::transaction(signature, tx)),
                None => complete = false,
            }
        }

        let mut state = self.cursor.lock();
        state.primed = true;
        if complete && newest.is_some() {
            state.until = newest;
        }
        debug!(
            records = records.len(),
            complete,
            cursor = ?state.until,
            "Signature discovery finished"
        );

        Ok(records)
    }
}

impl Discovery for SignatureDiscovery {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn fetch_candidates(&self) -> BoxFuture<'_, DiscoveryResult<Vec<RawRecord>>> {
        Box::pin(self.fetch())
    }
}

/// Lock-registry listing, one record per entry.
///
/// Without `backlog_on_start` the first successful listing only records
/// the ids present at startup; those entries are never reported.
pub struct RegistryDiscovery {
    client: Arc<RegistryClient>,
    limit: usize,
    /// Ids listed at startup. `None` until the first listing.
    seeded: Mutex<Option<HashSet<String>>>,
}

impl RegistryDiscovery {
    pub fn new(client: Arc<RegistryClient>, config: &DetectorConfig) -> Self {
        let seeded = config.backlog_on_start.then(HashSet::new);
        Self {
            client,
            limit: config.registry_page_limit,
            seeded: Mutex::new(seeded),
        }
    }

    async fn fetch(&self) -> DiscoveryResult<Vec<RawRecord>> {
        let entries = self
            .client
            .recent_locks(self.limit)
            .await
            .map_err(|e| DiscoveryError::upstream(self.name(), e))?;

        let records: Vec<RawRecord> = entries
            .into_iter()
            .map(|entry| {
                let id = entry.get("id").and_then(entry_id).unwrap_or_default();
                RawRecord::lock_entry(id, entry)
            })
            .collect();

        let mut seeded = self.seeded.lock();
        match seeded.as_ref() {
            None => {
                let ids: HashSet<String> =
                    records.iter().map(|r| r.source_id.clone()).collect();
                info!(skipped = ids.len(), "Registry seeded, existing locks not reported");
                *seeded = Some(ids);
                Ok(Vec::new())
            }
            Some(ids) if ids.is_empty() => Ok(records),
            Some(ids) => Ok(records
                .into_iter()
                .filter(|r| !ids.contains(&r.source_id))
                .collect()),
        }
    }
}

impl Discovery for RegistryDiscovery {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn fetch_candidates(&self) -> BoxFuture<'_, DiscoveryResult<Vec<RawRecord>>> {
        Box::pin(self.fetch())
    }
}

/// Runs strategies in order and concatenates their records.
pub struct CompositeDiscovery {
    strategies: Vec<Arc<dyn Discovery>>,
}

impl CompositeDiscovery {
    pub fn new(strategies: Vec<Arc<dyn Discovery>>) -> Self {
        Self { strategies }
    }

    async fn fetch(&self) -> DiscoveryResult<Vec<RawRecord>> {
        let mut records = Vec::new();
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match strategy.fetch_candidates().await {
                Ok(batch) => records.extend(batch),
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Discovery strategy failed");
                    failures.push(e.to_string());
                }
            }
        }

        if !self.strategies.is_empty() && failures.len() == self.strategies.len() {
            return Err(DiscoveryError::AllFailed(failures.join("; ")));
        }

        Ok(records)
    }
}

impl Discovery for CompositeDiscovery {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn fetch_candidates(&self) -> BoxFuture<'_, DiscoveryResult<Vec<RawRecord>>> {
        Box::pin(self.fetch())
    }
}

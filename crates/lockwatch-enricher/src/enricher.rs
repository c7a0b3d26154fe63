//! Candidate enrichment.

use crate::source::{MetadataSource, TokenSnapshot};
use lockwatch_core::{age_days, locked_percent, CandidateEvent, Clock, EnrichedEvent};
use lockwatch_telemetry::Metrics;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves token metadata for candidate events.
///
/// Sources are walked in order. Each field keeps the first non-empty,
/// non-zero value; the walk stops once the snapshot is complete. A failing
/// source leaves its fields to the next one.
pub struct Enricher {
    sources: Vec<Arc<dyn MetadataSource>>,
    clock: Arc<dyn Clock>,
}

impl Enricher {
    pub fn new(sources: Vec<Arc<dyn MetadataSource>>, clock: Arc<dyn Clock>) -> Self {
        Self { sources, clock }
    }

    /// Enrich a candidate. Never fails; unresolved fields stay `None`.
    pub async fn enrich(&self, mut candidate: CandidateEvent) -> EnrichedEvent {
        let snapshot = match candidate.mint.as_deref() {
            Some(mint) => self.snapshot(mint).await,
            None => TokenSnapshot::default(),
        };

        if candidate.created_at.is_none() {
            candidate.created_at = snapshot.created_at;
        }

        let locked_amount = candidate
            .raw_amount
            .and_then(|amount| amount.to_ui(snapshot.decimals));
        let now = self.clock.now();

        EnrichedEvent {
            locked_percent: locked_percent(locked_amount, snapshot.total_supply),
            age_days: age_days(candidate.created_at, now),
            name: snapshot.name,
            symbol: snapshot.symbol,
            market_cap_usd: snapshot.market_cap_usd,
            total_supply: snapshot.total_supply,
            locked_amount,
            candidate,
        }
    }

    async fn snapshot(&self, mint: &str) -> TokenSnapshot {
        let mut snapshot = TokenSnapshot::default();

        for source in &self.sources {
            match source.fetch(mint).await {
                Ok(partial) => snapshot.absorb(partial),
                Err(e) => {
                    warn!(
                        source = source.name(),
                        %mint,
                        error = %e,
                        "Metadata source failed, continuing without it"
                    );
                    Metrics::enrichment_gap(source.name(), e.label());
                }
            }

            if snapshot.is_complete() {
                break;
            }
        }

        debug!(
            %mint,
            name = ?snapshot.name,
            market_cap = ?snapshot.market_cap_usd,
            supply = ?snapshot.total_supply,
            "Metadata resolved"
        );
        snapshot
    }
}

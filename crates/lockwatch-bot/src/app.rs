//! Main application orchestration.
//!
//! Builds the pipeline from configuration:
//! - Shared HTTP transport and rate limiter
//! - Discovery strategy (signatures, registry, or both)
//! - Metadata sources in configured order
//! - Notifier over the Telegram sender

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::scheduler::Scheduler;
use lockwatch_core::SystemClock;
use lockwatch_detector::{
    CompositeDiscovery, DedupLedger, Discovery, EventExtractor, RegistryDiscovery,
    SignatureDiscovery,
};
use lockwatch_enricher::{
    DexScreenerSource, Enricher, MetadataSource, PumpFunSource, RpcSupplySource,
};
use lockwatch_notify::{format_startup, DynMessageSender, Notifier, TelegramSender};
use lockwatch_upstream::{
    DexScreenerClient, HttpTransport, PumpFunClient, RateLimiter, RegistryClient, RpcClient,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    rpc: Arc<RpcClient>,
    notifier: Notifier,
    scheduler: Arc<Scheduler>,
}

impl Application {
    /// Create the application with the Telegram sender.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let sender = TelegramSender::new(
            config.telegram.api_base.clone(),
            config.telegram.token.clone(),
            config.telegram.send_timeout(),
        )?;
        Self::with_sender(config, Arc::new(sender))
    }

    /// Create the application with a custom message sender.
    pub fn with_sender(config: AppConfig, sender: DynMessageSender) -> AppResult<Self> {
        let limiter = Arc::new(RateLimiter::new(
            config.http.max_requests,
            config.http.window(),
            config.http.max_inflight,
        ));
        let transport = HttpTransport::new(config.http.timeout(), limiter)?;

        let rpc = Arc::new(RpcClient::new(config.rpc.url.clone(), transport.clone()));
        let discovery = build_discovery(&config, &rpc, &transport)?;
        let sources = build_sources(&config, &rpc, &transport);

        let enricher = Arc::new(Enricher::new(sources, Arc::new(SystemClock)));
        let notifier = Notifier::new(sender, config.telegram.chat_id.clone());
        let scheduler = Scheduler::new(
            discovery,
            EventExtractor::new(&config.detector),
            Arc::new(DedupLedger::new()),
            enricher,
            notifier.clone(),
            config.scheduler.clone(),
        );

        Ok(Self {
            config,
            rpc,
            notifier,
            scheduler: Arc::new(scheduler),
        })
    }

    /// Scheduler driving the poll loop.
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Verify the RPC endpoint and announce startup.
    ///
    /// An unreachable RPC endpoint is fatal. A failed announcement is
    /// logged only.
    pub async fn run_preflight(&self) -> AppResult<()> {
        info!(rpc_url = %self.config.rpc.url, "Running preflight");

        let epoch = self
            .rpc
            .get_epoch_info()
            .await
            .map_err(|e| AppError::Preflight(format!("RPC endpoint check failed: {e}")))?;
        info!(
            epoch = epoch.epoch,
            slot = epoch.absolute_slot,
            "RPC endpoint reachable"
        );

        if self.config.telegram.startup_message {
            let text = format_startup(&self.config.detector.lock_program);
            match self.notifier.announce(&text).await {
                Ok(()) => info!("Startup message sent"),
                Err(e) => warn!(error = %e, "Startup message failed"),
            }
        }

        Ok(())
    }

    /// Run the poll loop until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> AppResult<()> {
        info!(
            lock_program = %self.config.detector.lock_program,
            "Starting application"
        );
        self.scheduler.run(cancel).await;
        info!(ledger_size = self.scheduler.ledger().len(), "Shutting down");
        Ok(())
    }

    /// Run the poll loop until Ctrl-C.
    pub async fn run_until_ctrl_c(self) -> AppResult<()> {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
            }
            trigger.cancel();
        });

        self.run(cancel).await
    }
}

fn build_discovery(
    config: &AppConfig,
    rpc: &Arc<RpcClient>,
    transport: &HttpTransport,
) -> AppResult<Arc<dyn Discovery>> {
    let mut strategies: Vec<Arc<dyn Discovery>> = Vec::new();

    if config.detector.signature_discovery {
        strategies.push(Arc::new(SignatureDiscovery::new(
            Arc::clone(rpc),
            &config.detector,
        )));
    }
    if let Some(url) = &config.detector.registry_url {
        let client = Arc::new(RegistryClient::new(url.clone(), transport.clone()));
        strategies.push(Arc::new(RegistryDiscovery::new(client, &config.detector)));
    }

    match strategies.len() {
        0 => Err(AppError::Config("no discovery strategy enabled".to_string())),
        1 => Ok(strategies.remove(0)),
        _ => Ok(Arc::new(CompositeDiscovery::new(strategies))),
    }
}

fn build_sources(
    config: &AppConfig,
    rpc: &Arc<RpcClient>,
    transport: &HttpTransport,
) -> Vec<Arc<dyn MetadataSource>> {
    config
        .metadata
        .sources
        .iter()
        .filter_map(|name| -> Option<Arc<dyn MetadataSource>> {
            match name.as_str() {
                "rpc_supply" => Some(Arc::new(RpcSupplySource::new(Arc::clone(rpc)))),
                "dexscreener" => Some(Arc::new(DexScreenerSource::new(Arc::new(
                    DexScreenerClient::new(config.metadata.dexscreener_url.clone(), transport.clone()),
                )))),
                "pumpfun" => Some(Arc::new(PumpFunSource::new(Arc::new(PumpFunClient::new(
                    config.metadata.pumpfun_url.clone(),
                    transport.clone(),
                ))))),
                other => {
                    warn!(source = other, "Unknown metadata source ignored");
                    None
                }
            }
        })
        .collect()
}

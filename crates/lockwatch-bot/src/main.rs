//! lockwatch: token-lock monitor entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Watches a token-lock program and posts new locks to Telegram.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LOCKWATCH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    lockwatch_telemetry::init_logging()?;

    info!("Starting lockwatch v{}", env!("CARGO_PKG_VERSION"));

    let config = lockwatch_bot::AppConfig::load(args.config.as_deref())?;
    info!(
        rpc_url = %config.rpc.url,
        lock_program = %config.detector.lock_program,
        poll_interval_secs = config.scheduler.poll_interval_secs,
        "Configuration loaded"
    );

    let app = lockwatch_bot::Application::new(config)?;
    app.run_preflight().await?;
    app.run_until_ctrl_c().await?;

    Ok(())
}

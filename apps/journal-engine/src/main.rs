//! Journal Engine Binary
//!
//! Refreshes the journal from the broker, reconstructs each trade's
//! historical context, prints a summary and mirrors the journal bundle.
//!
//! # Usage
//!
//! ```bash
//! journal-engine [path/to/journal.yaml]
//! ```
//!
//! # Environment Variables
//!
//! - `JOURNAL_CONFIG`: config path when no argument is given (default: journal.yaml)
//! - `RUST_LOG`: log filter; overrides `logging.level`
//!
//! Any `${VAR}` referenced from the config file may also be set in a `.env`.

use std::sync::Arc;

use anyhow::Context;
use journal_engine::application::ports::SyncTargetPort;
use journal_engine::config::{self, DEFAULT_CONFIG_PATH, JournalConfig};
use journal_engine::infrastructure::sync_target::FileMirrorTarget;
use journal_engine::telemetry::init_tracing;
use journal_engine::{Container, OandaLedgerAdapter, Trade};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("JOURNAL_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = config::load_config(Some(&config_path))
        .with_context(|| format!("loading {config_path}"))?;

    init_tracing(&config.logging.level);
    log_config(&config);

    let container = Container::from_config(&config).context("wiring engine")?;
    let shutdown = CancellationToken::new();

    let auto_sync = match &config.sync.mirror_path {
        Some(path) => Some(connect_mirror(&container, path, shutdown.clone()).await),
        None => None,
    };

    let trades = container
        .refresh_journal_use_case()
        .execute()
        .await
        .context("refreshing trade ledger")?;

    container
        .scheduler()
        .on_visible(&trades)
        .await
        .context("enrichment task failed")?;

    print_summary(&container.book().trades());

    let coordinator = container.coordinator();
    if coordinator.is_active() {
        if let Err(e) = coordinator.sync_now().await {
            tracing::warn!(error = %e, "Final mirror write failed");
        }
    }

    shutdown.cancel();
    if let Some(handle) = auto_sync {
        let _ = handle.await;
    }

    tracing::info!("Journal engine finished");
    Ok(())
}

/// Connect the file mirror and start debounced auto-sync.
async fn connect_mirror(
    container: &Container<OandaLedgerAdapter>,
    path: &str,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let coordinator = container.coordinator();
    let target: Arc<dyn SyncTargetPort> = Arc::new(FileMirrorTarget::new(path));
    let status = coordinator.connect(target).await;

    match &status.error {
        Some(error) => tracing::warn!(path, error = %error, "Mirror not connected"),
        None => tracing::info!(path, "Mirror connected"),
    }

    coordinator.spawn_auto_sync(container.events(), shutdown)
}

fn print_summary(trades: &[Trade]) {
    println!(
        "{:<10} {:<8} {:<6} {:<10} {:>12} {:>12} {:>8}",
        "TRADE", "SYMBOL", "SIDE", "STATUS", "ENTRY", "INIT STOP", "R"
    );
    for trade in trades {
        let ledger = &trade.ledger;
        let initial_stop = trade
            .initial_stop_loss()
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        let r = trade
            .risk_multiple()
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        println!(
            "{:<10} {:<8} {:<6} {:<10} {:>12} {:>12} {:>8}",
            ledger.id.as_str(),
            ledger.symbol.as_str(),
            format!("{:?}", ledger.direction).to_lowercase(),
            format!("{:?}", ledger.status).to_lowercase(),
            ledger.entry_price.to_string(),
            initial_stop,
            r
        );
    }
}

/// Log the parsed configuration.
fn log_config(config: &JournalConfig) {
    tracing::info!(
        environment = %config.broker.environment,
        account_id = %config.broker.account_id,
        data_dir = %config.storage.data_dir,
        mirror = config.sync.mirror_path.is_some(),
        "Configuration loaded"
    );
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Load .env file from the nearest ancestor directory that has one.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

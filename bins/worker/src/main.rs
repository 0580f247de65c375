//! Tally background worker.
//!
//! Runs one job and exits; scheduling is left to cron or a systemd timer.
//!
//! Usage:
//!   tally-worker process-due   - Materialize recurring transactions due today
//!   tally-worker reconcile     - Undo movements interrupted mid-way

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tally_shared::{AppConfig, config::LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "tally-worker")]
#[command(about = "Background jobs for the Tally balance engines")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Materialize every active recurring transaction that is due.
    ProcessDue,
    /// Compensate movements left pending longer than the threshold.
    Reconcile {
        /// Age in seconds after which a movement counts as interrupted.
        /// Defaults to `worker.reconcile_after_secs`.
        #[arg(long)]
        older_than_secs: Option<u64>,
    },
}

fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn reconcile_threshold(secs: u64) -> anyhow::Result<chrono::Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .context("reconcile threshold is too large")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let db = tally_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");
    let services = tally_db::services(&db);

    match cli.command {
        Command::ProcessDue => {
            let report = services.recurring.process_due_transactions().await?;
            info!(
                processed = report.processed,
                failed = report.failed,
                deactivated = report.deactivated,
                "recurring transactions processed"
            );
        }
        Command::Reconcile { older_than_secs } => {
            let secs = older_than_secs.unwrap_or(config.worker.reconcile_after_secs);
            let older_than = reconcile_threshold(secs)?;
            let report = services.sagas.reconcile(older_than).await?;
            info!(
                examined = report.examined,
                compensated = report.compensated,
                failed = report.failed,
                "reconciliation finished"
            );
        }
    }

    Ok(())
}

//! Elector daemon: entry point for running the elector bot and managing
//! its ledger.

mod admin;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use elector_node::{
    init_logging, Collaborators, ElectorConfig, ElectorService, LogFormat, Orchestrator,
    OrchestratorMetrics, OrchestratorSettings, ShutdownController,
};
use elector_store_lmdb::{LmdbStore, DEFAULT_MAP_SIZE};
use elector_toolchain::{FiftComposer, LiteClient, ValidatorConsole};
use elector_utils::{format_duration, SystemClock, ThreadPacer};

use crate::admin::{NodeAction, ParticipationAction, WalletAction};

#[derive(Parser)]
#[command(name = "elector-daemon", about = "Validator election participation bot")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "ELECTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the ledger.
    #[arg(long, env = "ELECTOR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ELECTOR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ELECTOR_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the orchestrator until SIGINT/SIGTERM.
    Run {
        /// Seconds between ticks.
        #[arg(long, env = "ELECTOR_POLL_INTERVAL")]
        poll_interval_secs: Option<u64>,

        /// Stake per bid, in whole coins.
        #[arg(long, env = "ELECTOR_STAKE")]
        stake: Option<u64>,

        /// Write Prometheus metrics to this file after every tick.
        #[arg(long, env = "ELECTOR_METRICS_FILE")]
        metrics_file: Option<PathBuf>,
    },
    /// Manage funding wallets.
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// Manage validator nodes.
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Inspect submitted bids.
    Participation {
        #[command(subcommand)]
        action: ParticipationAction,
    },
}

/// File settings overridden by whatever the command line provides.
fn load_config(cli: &Cli) -> anyhow::Result<ElectorConfig> {
    let mut config = match &cli.config {
        Some(path) => ElectorConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ElectorConfig::default(),
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Command::Run {
        poll_interval_secs,
        stake,
        metrics_file,
    } = &cli.command
    {
        if let Some(secs) = poll_interval_secs {
            config.poll_interval_secs = *secs;
        }
        if let Some(coins) = stake {
            config.stake_amount = *coins;
        }
        if metrics_file.is_some() {
            config.metrics_file = metrics_file.clone();
        }
    }

    config.validate()?;
    Ok(config)
}

fn open_ledger(config: &ElectorConfig) -> anyhow::Result<LmdbStore> {
    LmdbStore::open(&config.data_dir, DEFAULT_MAP_SIZE)
        .with_context(|| format!("opening ledger at {}", config.data_dir.display()))
}

async fn run(config: ElectorConfig) -> anyhow::Result<()> {
    let ledger = Arc::new(open_ledger(&config)?);
    let timeout = config.tool_timeout();
    let verbose = config.verbose_tools;

    let composer = FiftComposer::new(config.fift.clone(), timeout, verbose)
        .context("preparing fift work directory")?;
    let collaborators = Collaborators {
        ledger,
        chain: Arc::new(LiteClient::new(config.lite_client.clone(), timeout, verbose)),
        console: Arc::new(ValidatorConsole::new(config.console.clone(), timeout, verbose)),
        composer: Arc::new(composer),
        clock: Arc::new(SystemClock),
        pacer: Arc::new(ThreadPacer),
    };

    let metrics = Arc::new(OrchestratorMetrics::new()?);
    let orchestrator = Arc::new(Orchestrator::new(
        collaborators,
        OrchestratorSettings::from_config(&config),
        metrics,
    ));
    let service = ElectorService::new(
        orchestrator,
        config.poll_interval(),
        config.metrics_file.clone(),
    );

    let shutdown = Arc::new(ShutdownController::new());
    let shutdown_rx = shutdown.subscribe();
    let signals = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signals.wait_for_signal().await {
            tracing::error!(error = %e, "failed to listen for shutdown signals");
        }
    });

    tracing::info!(
        data_dir = %config.data_dir.display(),
        poll_interval = %format_duration(config.poll_interval_secs),
        stake = %config.stake(),
        max_factor = %config.max_factor,
        "starting elector"
    );
    service.run(shutdown_rx).await?;
    tracing::info!("elector daemon exited cleanly");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Run { .. } => run(config).await,
        Command::Wallet { action } => admin::wallet(&open_ledger(&config)?, action),
        Command::Node { action } => admin::node(&open_ledger(&config)?, action),
        Command::Participation { action } => admin::participation(&open_ledger(&config)?, action),
    }
}

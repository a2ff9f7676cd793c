//! revive-monitor — checks the service once and heals it if needed.
//!
//! Meant to be run periodically by an external scheduler (cron, a systemd
//! timer). The exit code is the whole contract:
//!
//! - `0`: service healthy, or restarted and recovered
//! - `1`: service unrecoverable (restart disabled or failed, or it never
//!   came back)
//! - `2`: the monitor could not start (bad config, unusable log file)
//!
//! # Usage
//!
//! ```text
//! revive-monitor --config configs/monitor.toml          # full cycle
//! revive-monitor --config configs/monitor.toml probe    # probe only
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use revive_core::{MonitorConfig, init_logging};
use revive_health::{HealthProbe, Monitor, RunOutcome};

/// Exit status for failures before the monitor could run.
const STARTUP_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "revive-monitor", about = "Self-healing health monitor", version)]
struct Cli {
    /// Path to the monitor config file.
    #[arg(short, long, global = true, default_value = "configs/monitor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Command {
    /// Probe, restart if unhealthy, and wait for recovery (default).
    #[default]
    Run,
    /// Probe once and report; never restarts anything.
    Probe,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match startup(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("revive-monitor: {e:#}");
            return ExitCode::from(STARTUP_FAILURE);
        }
    };

    match cli.command.unwrap_or_default() {
        Command::Run => run(&config).await.into(),
        Command::Probe => probe(&config).await,
    }
}

fn startup(path: &Path) -> anyhow::Result<MonitorConfig> {
    let config = MonitorConfig::from_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    init_logging(&config.log_file, &config.log_level).context("failed to initialise logging")?;
    Ok(config)
}

async fn run(config: &MonitorConfig) -> RunOutcome {
    info!("========================================");
    info!(
        url = %config.health_url(),
        service = %config.service_name,
        "starting monitoring check"
    );
    info!("========================================");

    let outcome = Monitor::from_config(config).run().await;

    if outcome.is_success() {
        info!(?outcome, "monitoring finished successfully");
    } else {
        error!(?outcome, exit_code = outcome.exit_code(), "monitoring finished with errors");
    }
    outcome
}

async fn probe(config: &MonitorConfig) -> ExitCode {
    let result = HealthProbe::from_config(config).probe().await;
    if result.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

//! IOU ledger command line
//!
//! Runs scenario files against an in-memory ledger and inspects settlement
//! checkpoints.

mod scenario;

use clap::{Parser, Subcommand};
use iou_ledger_core::{CheckpointError, LedgerError, SettlementCheckpoint, SettlementError};
use scenario::{Scenario, ScenarioRunner};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid scenario: {0}")]
    Scenario(#[from] serde_json::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

#[derive(Debug, Parser)]
#[command(name = "iou-ledger", version, about = "Log-derived IOU ledger with cycle-canceling settlement")]
struct Cli {
    /// Log filter (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario file and print one JSON result per step
    Run {
        scenario: PathBuf,

        /// Where to write the checkpoint of an interrupted settlement
        #[arg(long)]
        checkpoint_out: Option<PathBuf>,
    },

    /// Verify a settlement checkpoint and print its resumption point
    InspectCheckpoint { path: PathBuf },
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn read(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Run {
            scenario,
            checkpoint_out,
        } => {
            let scenario: Scenario = serde_json::from_str(&read(&scenario).await?)?;
            let runner = ScenarioRunner::new(&scenario, checkpoint_out);
            for step in &scenario.steps {
                let result = runner.run_step(step).await?;
                println!("{}", serde_json::to_string(&result)?);
            }
        }
        Command::InspectCheckpoint { path } => {
            let plan = SettlementCheckpoint::from_json(&read(&path).await?)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Err(error) = run(cli).await {
        tracing::error!("{}", error);
        std::process::exit(1);
    }
}

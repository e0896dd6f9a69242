//! TaskFlow command-line front end
//!
//! Plays the part of the UI: it validates what the user typed, calls the
//! task session, prints the resulting views, and waits for background
//! saves before exiting.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskflow_core::config::Config;
use taskflow_core::storage::FileKeyValueStore;
use taskflow_core::TaskSession;

use crate::commands::Command;

#[derive(Parser, Debug)]
#[command(name = "taskflow", version, about = "Personal task manager")]
struct Cli {
    /// Data directory (overrides TASKFLOW_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskflow_cli=info,taskflow_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    tracing::debug!("Using data directory: {:?}", config.data_dir);

    let storage = Arc::new(FileKeyValueStore::new(&config.data_dir));
    let mut session = TaskSession::open_with_system_clock(storage, config.layout()).await;

    let result = commands::run(&mut session, cli.command).await;

    // Background saves must land before the process exits
    session.flush().await;
    result
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nerve - event bus runner and store inspector

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod logging;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{chain, events, run};
use nerve_core::NerveConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "nerve",
    version,
    about = "nerve - in-process event bus with correlation tracking"
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Event store file, overriding the configured one
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bus, reading publish requests from stdin
    Run(run::RunArgs),
    /// List stored events
    Events(events::EventsArgs),
    /// Show every stored event of one correlation chain
    Chain(chain::ChainArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => NerveConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => NerveConfig::default(),
    };
    if let Some(store) = cli.store {
        config.store.path = Some(store);
    }

    let _log_guard = logging::setup(&config)?;

    match cli.command {
        Commands::Run(args) => run::run(config, args).await,
        Commands::Events(args) => events::events(&config, args),
        Commands::Chain(args) => chain::chain(&config, args),
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nerve chain <correlation-id>` - show a stored correlation chain

use crate::output::{print_list, OutputFormat};
use anyhow::Result;
use clap::Args;
use nerve_core::NerveConfig;
use nerve_storage::EventStore;

#[derive(Args)]
pub struct ChainArgs {
    /// Correlation id shared by the chain's events
    pub correlation_id: String,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub fn chain(config: &NerveConfig, args: ChainArgs) -> Result<()> {
    let store = super::open_store(config)?;
    let rows = store.by_correlation(&args.correlation_id);
    print_list(
        &rows,
        args.format,
        &format!("No events for correlation {}", args.correlation_id),
    );
    Ok(())
}

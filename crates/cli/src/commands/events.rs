// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nerve events` - list stored events

use crate::output::{print_list, OutputFormat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use nerve_core::NerveConfig;
use nerve_storage::EventStore;

#[derive(Args)]
pub struct EventsArgs {
    /// Only events of this exact type
    #[arg(long = "type", value_name = "TYPE")]
    pub event_type: Option<String>,

    /// Only events created at or after this RFC 3339 time
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// Most recent events to show
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub fn events(config: &NerveConfig, args: EventsArgs) -> Result<()> {
    let store = super::open_store(config)?;
    let since = args.since.unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut rows = match &args.event_type {
        Some(event_type) => store.by_type(event_type, since, args.limit),
        None => store.recent(args.limit),
    };
    if args.event_type.is_none() {
        rows.retain(|r| r.created_at >= since);
    }

    print_list(&rows, args.format, "No events");
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod chain;
pub mod events;
pub mod run;

use anyhow::{bail, Result};
use nerve_core::NerveConfig;
use nerve_storage::JsonlEventStore;

/// Open the configured event log for queries. Never creates one.
fn open_store(config: &NerveConfig) -> Result<JsonlEventStore> {
    let Some(path) = &config.store.path else {
        bail!("no event store configured (pass --store or set [store] path)");
    };
    if !path.is_file() {
        bail!("no event store at {}", path.display());
    }
    Ok(JsonlEventStore::open_read_only(path)?)
}

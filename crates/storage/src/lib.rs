// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nerve-storage: Durable event log for the nerve bus
//!
//! Events are appended as JSON lines and indexed in memory by
//! `(type, created_at)` and by correlation id. Reopening a log replays it and
//! rebuilds the indexes.

mod error;
mod index;
mod jsonl;
mod record;
mod store;

pub use error::StoreError;
pub use jsonl::JsonlEventStore;
pub use record::StoredEvent;
pub use store::{EventStore, MemoryEventStore};

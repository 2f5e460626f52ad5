// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event store interface

use crate::error::StoreError;
use crate::index::EventIndex;
use crate::record::StoredEvent;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Append-only event persistence.
///
/// Writes go through `persist` and `mark_processed`; the query methods read
/// the in-memory indexes and never touch disk.
pub trait EventStore: Send + Sync {
    /// Append a row. Fails if a row with the same id exists.
    fn persist(&self, record: StoredEvent) -> Result<(), StoreError>;

    /// Flag a stored row as processed
    fn mark_processed(&self, id: &str) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Option<StoredEvent>;

    /// Rows of one type with `created_at >= since`, oldest first, at most
    /// `limit` (the most recent)
    fn by_type(&self, event_type: &str, since: DateTime<Utc>, limit: usize) -> Vec<StoredEvent>;

    /// Rows of one correlation chain in arrival order
    fn by_correlation(&self, correlation_id: &str) -> Vec<StoredEvent>;

    /// The `limit` most recently stored rows, oldest first
    fn recent(&self, limit: usize) -> Vec<StoredEvent>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push buffered writes to stable storage
    fn sync(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store that keeps rows in memory only
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    index: Mutex<EventIndex>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_index<R>(&self, f: impl FnOnce(&mut EventIndex) -> R) -> R {
        let mut index = self.index.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut index)
    }
}

impl EventStore for MemoryEventStore {
    fn persist(&self, record: StoredEvent) -> Result<(), StoreError> {
        self.with_index(|index| index.insert(record))
    }

    fn mark_processed(&self, id: &str) -> Result<(), StoreError> {
        self.with_index(|index| index.mark_processed(id))
    }

    fn get(&self, id: &str) -> Option<StoredEvent> {
        self.with_index(|index| index.get(id).cloned())
    }

    fn by_type(&self, event_type: &str, since: DateTime<Utc>, limit: usize) -> Vec<StoredEvent> {
        self.with_index(|index| index.by_type(event_type, since, limit))
    }

    fn by_correlation(&self, correlation_id: &str) -> Vec<StoredEvent> {
        self.with_index(|index| index.by_correlation(correlation_id))
    }

    fn recent(&self, limit: usize) -> Vec<StoredEvent> {
        self.with_index(|index| index.recent(limit))
    }

    fn len(&self) -> usize {
        self.with_index(|index| index.len())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

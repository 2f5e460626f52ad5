// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory indexes over stored rows

use crate::error::StoreError;
use crate::record::StoredEvent;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

/// Rows in arrival order plus lookup indexes by id, `(type, created_at)` and
/// correlation id. Rows are never removed.
#[derive(Debug, Default)]
pub(crate) struct EventIndex {
    rows: Vec<StoredEvent>,
    by_id: HashMap<String, usize>,
    by_type: HashMap<String, BTreeSet<(DateTime<Utc>, usize)>>,
    by_correlation: HashMap<String, Vec<usize>>,
}

impl EventIndex {
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn insert(&mut self, record: StoredEvent) -> Result<(), StoreError> {
        if self.contains(&record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }

        let pos = self.rows.len();
        self.by_id.insert(record.id.clone(), pos);
        self.by_type
            .entry(record.event_type.clone())
            .or_default()
            .insert((record.created_at, pos));
        self.by_correlation
            .entry(record.correlation_id.clone())
            .or_default()
            .push(pos);
        self.rows.push(record);
        Ok(())
    }

    pub fn mark_processed(&mut self, id: &str) -> Result<(), StoreError> {
        let pos = self
            .by_id
            .get(id)
            .copied()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(row) = self.rows.get_mut(pos) {
            row.processed = true;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&StoredEvent> {
        self.by_id.get(id).and_then(|&pos| self.rows.get(pos))
    }

    /// Rows of `event_type` created at or after `since`, oldest first, keeping
    /// only the `limit` most recent
    pub fn by_type(&self, event_type: &str, since: DateTime<Utc>, limit: usize) -> Vec<StoredEvent> {
        let Some(entries) = self.by_type.get(event_type) else {
            return Vec::new();
        };

        let mut rows: Vec<StoredEvent> = entries
            .range((since, 0)..)
            .rev()
            .take(limit)
            .filter_map(|&(_, pos)| self.rows.get(pos).cloned())
            .collect();
        rows.reverse();
        rows
    }

    /// Rows sharing `correlation_id`, in arrival order
    pub fn by_correlation(&self, correlation_id: &str) -> Vec<StoredEvent> {
        self.by_correlation
            .get(correlation_id)
            .map(|positions| {
                positions
                    .iter()
                    .filter_map(|&pos| self.rows.get(pos).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The `limit` most recently stored rows, oldest first
    pub fn recent(&self, limit: usize) -> Vec<StoredEvent> {
        let start = self.rows.len().saturating_sub(limit);
        self.rows[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;

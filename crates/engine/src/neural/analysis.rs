// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chain grouping and pattern matching

use super::capability::CollaborationRecord;
use nerve_core::Event;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Group events by correlation id, keeping groups in first-seen order and
/// events in their original order
pub(crate) fn group_by_correlation(events: &[Arc<Event>]) -> Vec<(String, Vec<Arc<Event>>)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Arc<Event>>)> = Vec::new();

    for event in events {
        let slot = *slots.entry(event.correlation_id.as_str()).or_insert_with(|| {
            groups.push((event.correlation_id.clone(), Vec::new()));
            groups.len() - 1
        });
        if let Some((_, group)) = groups.get_mut(slot) {
            group.push(Arc::clone(event));
        }
    }

    groups
}

/// Index of the first pattern whose three types all occur in `chain`
pub(crate) fn matching_pattern(chain: &[Arc<Event>], patterns: &[[String; 3]]) -> Option<usize> {
    patterns.iter().position(|pattern| {
        pattern
            .iter()
            .all(|wanted| chain.iter().any(|e| &e.event_type == wanted))
    })
}

/// Successful collaborations per participant set
pub(crate) fn success_counts<'a>(
    records: impl IntoIterator<Item = &'a CollaborationRecord>,
) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for record in records.into_iter().filter(|r| r.success) {
        *counts.entry(record.pattern_key()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;

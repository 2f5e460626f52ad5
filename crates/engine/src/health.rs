// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus health snapshot types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Healthy,
    Stale,
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => f.pad("healthy"),
            Self::Stale => f.pad("stale"),
        }
    }
}

/// Per-component counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentStats {
    pub events_published: u64,
    pub subscriptions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentHealth {
    pub last_seen: DateTime<Utc>,
    pub status: ComponentStatus,
    pub stats: ComponentStats,
}

/// Point-in-time view of the bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusHealth {
    /// Components that have published at least once
    pub active_components: usize,
    /// Events currently held in memory, expired or not
    pub recent_events: usize,
    pub active_correlations: usize,
    /// Distinct event types published
    pub event_types: usize,
    pub total_events_processed: u64,
    pub subscriptions: usize,
    pub components: BTreeMap<String, ComponentHealth>,
}

impl BusHealth {
    /// Names of components currently reported stale
    pub fn stale(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter(|(_, c)| c.status == ComponentStatus::Stale)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl fmt::Display for BusHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "events: {} processed, {} in memory, {} types, {} correlations",
            self.total_events_processed,
            self.recent_events,
            self.event_types,
            self.active_correlations
        )?;
        write!(
            f,
            "components: {} active, {} subscriptions",
            self.active_components, self.subscriptions
        )?;
        for (name, component) in &self.components {
            write!(
                f,
                "\n  {:<24} {:<8} published={} subscriptions={}",
                name,
                component.status,
                component.stats.events_published,
                component.stats.subscriptions
            )?;
        }
        Ok(())
    }
}

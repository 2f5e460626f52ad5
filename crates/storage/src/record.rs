// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted event rows

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use nerve_core::{Event, Payload};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An event as it is written to the store.
///
/// Payload and tags are kept as serialized JSON text so the row shape does
/// not depend on what publishers put in them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub priority: u8,
    pub correlation_id: String,
    pub payload: String,
    pub tags: String,
    #[serde(default)]
    pub processed: bool,
}

impl StoredEvent {
    pub fn from_event(event: &Event) -> Result<Self, StoreError> {
        Ok(Self {
            id: event.id.clone(),
            event_type: event.event_type.clone(),
            source: event.source.clone(),
            created_at: event.created_at,
            priority: event.priority.get(),
            correlation_id: event.correlation_id.clone(),
            payload: serde_json::to_string(&event.payload)?,
            tags: serde_json::to_string(&event.tags)?,
            processed: false,
        })
    }

    /// Decode the payload text
    pub fn payload_value(&self) -> Result<Payload, StoreError> {
        Ok(serde_json::from_str(&self.payload)?)
    }

    /// Decode the tag text
    pub fn tag_list(&self) -> Result<Vec<String>, StoreError> {
        Ok(serde_json::from_str(&self.tags)?)
    }
}

impl fmt::Display for StoredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} source={} correlation={} priority={}",
            self.created_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.event_type,
            self.id,
            self.source,
            self.correlation_id,
            self.priority,
        )?;
        if self.processed {
            write!(f, " processed")?;
        }
        write!(f, " {}", self.payload)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;

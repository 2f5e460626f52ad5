// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types for the nerve bus

use crate::error::BusError;
use crate::id::IdGen;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Event payload: a string-keyed JSON object, opaque to the bus
pub type Payload = serde_json::Map<String, Value>;

/// Default event lifetime when the publisher does not set one
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Event priority, 1 (critical) through 10 (low).
///
/// Informational only; delivery order never depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const CRITICAL: Priority = Priority(1);
    pub const NORMAL: Priority = Priority(5);
    pub const LOW: Priority = Priority(8);
    pub const LOWEST: Priority = Priority(10);

    pub fn new(value: u8) -> Result<Self, BusError> {
        if (1..=10).contains(&value) {
            Ok(Self(value))
        } else {
            Err(BusError::InvalidPriority(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<u8> for Priority {
    type Error = BusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that happened, as recorded by the bus.
///
/// Events are created only by `publish` and shared as `Arc<Event>`; nothing
/// mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: Payload,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub priority: Priority,
    pub correlation_id: String,
    pub tags: BTreeSet<String>,
    pub ttl_seconds: u64,
}

impl Event {
    /// When this event stops being visible, or `None` if the TTL is too
    /// large to represent (never expires)
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.ttl_seconds).ok()?;
        let ttl = TimeDelta::try_seconds(secs)?;
        self.created_at.checked_add_signed(ttl)
    }

    /// An event is expired once `created_at + ttl < now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at < now)
    }

    /// Look up a string field in the payload
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// A publish request.
///
/// ```ignore
/// bus.publish(
///     Publish::new("orders.created", "checkout")
///         .payload(json!({"order": 42}))
///         .priority(3)
///         .correlation_id("c1"),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct Publish {
    event_type: String,
    source: String,
    payload: Value,
    priority: u8,
    correlation_id: Option<String>,
    tags: BTreeSet<String>,
    ttl_seconds: Option<u64>,
}

impl Publish {
    pub fn new(event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source: source.into(),
            payload: Value::Object(Payload::new()),
            priority: Priority::NORMAL.get(),
            correlation_id: None,
            tags: BTreeSet::new(),
            ttl_seconds: None,
        }
    }

    /// Set the payload. `null` means an empty payload; anything other than
    /// an object is rejected when the event is built.
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn payload_map(mut self, payload: Payload) -> Self {
        self.payload = Value::Object(payload);
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn maybe_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn tags<T: Into<String>>(mut self, tags: impl IntoIterator<Item = T>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn ttl(self, ttl: Duration) -> Self {
        self.ttl_seconds(ttl.as_secs())
    }

    pub fn ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check the request without consuming it
    pub fn validate(&self) -> Result<(), BusError> {
        if self.event_type.is_empty() {
            return Err(BusError::EmptyEventType);
        }
        if self.event_type.contains('*') {
            return Err(BusError::WildcardInEventType(self.event_type.clone()));
        }
        if self.source.is_empty() {
            return Err(BusError::EmptySource);
        }
        Priority::new(self.priority)?;
        if matches!(&self.correlation_id, Some(id) if id.is_empty()) {
            return Err(BusError::EmptyCorrelationId);
        }
        match &self.payload {
            Value::Object(_) | Value::Null => Ok(()),
            other => Err(BusError::PayloadNotObject(json_kind(other))),
        }
    }

    /// Turn the request into an event, assigning identity and metadata.
    ///
    /// A missing correlation id gets a fresh one, so uncorrelated events are
    /// each a chain of one.
    pub fn build(
        self,
        ids: &impl IdGen,
        now: DateTime<Utc>,
        default_ttl: Duration,
    ) -> Result<Event, BusError> {
        self.validate()?;
        let priority = Priority::new(self.priority)?;
        let payload = match self.payload {
            Value::Object(map) => map,
            _ => Payload::new(),
        };

        Ok(Event {
            id: ids.next(),
            event_type: self.event_type,
            payload,
            source: self.source,
            created_at: now,
            priority,
            correlation_id: self.correlation_id.unwrap_or_else(|| ids.next()),
            tags: self.tags,
            ttl_seconds: self.ttl_seconds.unwrap_or(default_ttl.as_secs()),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

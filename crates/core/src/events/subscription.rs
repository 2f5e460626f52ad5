// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic pattern matching and subscriptions

use super::handler::EventHandler;
use crate::error::BusError;
use std::fmt;
use std::sync::Arc;

/// Pattern for matching event types
/// Supports:
///   - Exact: "orders.created"
///   - Universal wildcard: "*" matches every event
///   - Prefix: "orders.*" matches any type starting with "orders."
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventPattern {
    All,
    Prefix(String),
    Exact(String),
}

impl EventPattern {
    /// Parse a pattern string. A `*` is only allowed as the final character.
    pub fn parse(pattern: &str) -> Result<Self, BusError> {
        let invalid = |reason| BusError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.is_empty() {
            return Err(invalid("pattern must not be empty"));
        }
        if pattern == "*" {
            return Ok(Self::All);
        }

        let (head, wildcard) = match pattern.strip_suffix('*') {
            Some(prefix) => (prefix, true),
            None => (pattern, false),
        };
        if head.contains('*') {
            return Err(invalid("'*' may only appear at the end"));
        }

        if wildcard {
            Ok(Self::Prefix(head.to_string()))
        } else {
            Ok(Self::Exact(head.to_string()))
        }
    }

    /// Check if this pattern matches an event type
    pub fn matches(&self, event_type: &str) -> bool {
        match self {
            Self::All => true,
            Self::Prefix(prefix) => event_type.starts_with(prefix.as_str()),
            Self::Exact(exact) => exact == event_type,
        }
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Prefix(prefix) => write!(f, "{}*", prefix),
            Self::Exact(exact) => f.write_str(exact),
        }
    }
}

/// A handler registered under a pattern on behalf of a component
#[derive(Clone)]
pub struct Subscription {
    pub pattern: EventPattern,
    pub component: String,
    pub handler: Arc<dyn EventHandler>,
}

impl Subscription {
    pub fn new(
        pattern: EventPattern,
        component: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            pattern,
            component: component.into(),
            handler,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pattern", &self.pattern)
            .field("component", &self.component)
            .field("handler", &self.handler.name())
            .finish()
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;

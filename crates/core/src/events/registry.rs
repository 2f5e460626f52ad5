// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pattern-indexed subscription registry

use super::handler::EventHandler;
use super::subscription::{EventPattern, Subscription};
use crate::error::BusError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Registry of subscriptions keyed by pattern.
///
/// Registration is additive: the same handler may be registered under several
/// patterns, or several times under one pattern, and is then invoked once per
/// registration that matches. There is no unsubscribe.
#[derive(Default)]
pub struct SubscriptionRegistry {
    exact: HashMap<String, Vec<Subscription>>,
    all: Vec<Subscription>,
    prefixes: BTreeMap<String, Vec<Subscription>>,
    count: usize,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `pattern` on behalf of `component`
    pub fn subscribe(
        &mut self,
        pattern: &str,
        handler: Arc<dyn EventHandler>,
        component: &str,
    ) -> Result<EventPattern, BusError> {
        if component.is_empty() {
            return Err(BusError::EmptyComponent);
        }
        let pattern = EventPattern::parse(pattern)?;
        let subscription = Subscription::new(pattern.clone(), component, handler);

        match &pattern {
            EventPattern::All => self.all.push(subscription),
            EventPattern::Prefix(prefix) => self
                .prefixes
                .entry(prefix.clone())
                .or_default()
                .push(subscription),
            EventPattern::Exact(exact) => self
                .exact
                .entry(exact.clone())
                .or_default()
                .push(subscription),
        }
        self.count += 1;

        Ok(pattern)
    }

    /// All subscriptions matching `event_type`: exact first, then `*`, then
    /// prefixes in lexical order. Within one pattern, registration order.
    pub fn matching(&self, event_type: &str) -> Vec<Subscription> {
        let mut matched = Vec::new();

        if let Some(subs) = self.exact.get(event_type) {
            matched.extend(subs.iter().cloned());
        }
        matched.extend(self.all.iter().cloned());
        for (prefix, subs) in &self.prefixes {
            if event_type.starts_with(prefix.as_str()) {
                matched.extend(subs.iter().cloned());
            }
        }

        matched
    }

    /// Total number of registrations
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Distinct registered patterns, sorted
    pub fn patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self
            .exact
            .keys()
            .cloned()
            .chain(self.prefixes.keys().map(|p| format!("{}*", p)))
            .collect();
        if !self.all.is_empty() {
            patterns.push("*".to_string());
        }
        patterns.sort();
        patterns
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event bus coordinator
//!
//! Publishing validates and stamps the event, records it in the in-memory
//! history and its correlation chain, hands it to the persist writer, fans it
//! out to matching handlers and finally updates heartbeats and counters.

use crate::component::ComponentHandle;
use crate::dispatch;
use crate::health::{BusHealth, ComponentHealth, ComponentStats, ComponentStatus};
use crate::persist::PersistWriter;
use chrono::{DateTime, Utc};
use nerve_core::clock::to_time_delta;
use nerve_core::{
    BusConfig, BusError, Clock, Event, EventHandler, EventPattern, IdGen, Publish,
    SubscriptionRegistry, SystemClock, UuidIdGen,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

/// Event type published when the health monitor finds stale components
pub const STALE_EVENT: &str = "ecosystem.components_stale";

/// Source used for events the bus itself publishes
pub const BUS_SOURCE: &str = "ecosystem_bus";

/// Bus dependencies
pub struct BusDeps<C, I> {
    pub clock: C,
    pub ids: I,
    /// Writer for durable storage; `None` keeps events in memory only
    pub persist: Option<PersistWriter>,
}

impl Default for BusDeps<SystemClock, UuidIdGen> {
    fn default() -> Self {
        Self {
            clock: SystemClock,
            ids: UuidIdGen,
            persist: None,
        }
    }
}

#[derive(Default)]
struct BusState {
    history: VecDeque<Arc<Event>>,
    chains: HashMap<String, Vec<Arc<Event>>>,
    heartbeats: BTreeMap<String, DateTime<Utc>>,
    component_stats: BTreeMap<String, ComponentStats>,
    event_counts: HashMap<String, u64>,
    deliveries: HashMap<String, u64>,
    total_published: u64,
    registry: SubscriptionRegistry,
}

struct BusInner<C, I> {
    config: BusConfig,
    clock: C,
    ids: I,
    persist: Option<PersistWriter>,
    state: Mutex<BusState>,
}

/// In-process publish/subscribe bus.
///
/// Cloning is cheap; clones share one bus.
pub struct EventBus<C: Clock = SystemClock, I: IdGen = UuidIdGen> {
    inner: Arc<BusInner<C, I>>,
}

impl<C: Clock, I: IdGen> Clone for EventBus<C, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl EventBus {
    /// Create a bus on the system clock with UUID ids and no persistence
    pub fn new(config: BusConfig) -> Self {
        Self::with_deps(config, BusDeps::default())
    }
}

impl<C: Clock, I: IdGen> EventBus<C, I> {
    pub fn with_deps(config: BusConfig, deps: BusDeps<C, I>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                config,
                clock: deps.clock,
                ids: deps.ids,
                persist: deps.persist,
                state: Mutex::new(BusState::default()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    pub fn clock(&self) -> &C {
        &self.inner.clock
    }

    /// Publish an event, returning its id.
    ///
    /// Only validation failures are reported; persistence and handler
    /// failures are logged.
    pub fn publish(&self, request: Publish) -> Result<String, BusError> {
        let now = self.inner.clock.now();
        let event = Arc::new(request.build(&self.inner.ids, now, self.inner.config.default_ttl)?);

        let subscriptions = {
            let mut state = self.lock();
            state.history.push_back(Arc::clone(&event));
            while state.history.len() > self.inner.config.history_capacity {
                state.history.pop_front();
            }
            state
                .chains
                .entry(event.correlation_id.clone())
                .or_default()
                .push(Arc::clone(&event));
            state.registry.matching(&event.event_type)
        };

        if let Some(persist) = &self.inner.persist {
            persist.submit(&event);
        }

        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            source = %event.source,
            correlation_id = %event.correlation_id,
            handlers = subscriptions.len(),
            "event published"
        );

        let handlers = subscriptions.len() as u64;
        dispatch::dispatch(
            Arc::clone(&event),
            subscriptions,
            self.inner.config.max_dispatch_depth,
        );

        let seen = self.inner.clock.now();
        let mut state = self.lock();
        state.heartbeats.insert(event.source.clone(), seen);
        state
            .component_stats
            .entry(event.source.clone())
            .or_default()
            .events_published += 1;
        *state
            .event_counts
            .entry(event.event_type.clone())
            .or_default() += 1;
        *state
            .deliveries
            .entry(event.event_type.clone())
            .or_default() += handlers;
        state.total_published += 1;

        Ok(event.id.clone())
    }

    /// Register `handler` for events matching `pattern` on behalf of `component`
    pub fn subscribe(
        &self,
        pattern: &str,
        handler: Arc<dyn EventHandler>,
        component: &str,
    ) -> Result<EventPattern, BusError> {
        let mut state = self.lock();
        let parsed = state.registry.subscribe(pattern, handler, component)?;
        state
            .component_stats
            .entry(component.to_string())
            .or_default()
            .subscriptions += 1;
        tracing::debug!(pattern = %parsed, component, "subscribed");
        Ok(parsed)
    }

    /// Register one handler under several patterns.
    ///
    /// All patterns are validated before any is registered.
    pub fn subscribe_multiple(
        &self,
        patterns: &[&str],
        handler: Arc<dyn EventHandler>,
        component: &str,
    ) -> Result<Vec<EventPattern>, BusError> {
        if component.is_empty() {
            return Err(BusError::EmptyComponent);
        }
        for pattern in patterns {
            EventPattern::parse(pattern)?;
        }
        patterns
            .iter()
            .map(|pattern| self.subscribe(pattern, Arc::clone(&handler), component))
            .collect()
    }

    /// Up to `limit` most recent non-expired events, optionally of one type,
    /// most recent last
    pub fn recent_events(&self, event_type: Option<&str>, limit: usize) -> Vec<Arc<Event>> {
        let now = self.inner.clock.now();
        let state = self.lock();
        let mut events: Vec<Arc<Event>> = state
            .history
            .iter()
            .rev()
            .filter(|e| !e.is_expired(now))
            .filter(|e| match event_type {
                Some(t) => e.event_type == t,
                None => true,
            })
            .take(limit)
            .cloned()
            .collect();
        events.reverse();
        events
    }

    /// Non-expired events sharing `correlation_id`, in arrival order
    pub fn correlation_chain(&self, correlation_id: &str) -> Vec<Arc<Event>> {
        let now = self.inner.clock.now();
        let state = self.lock();
        state
            .chains
            .get(correlation_id)
            .map(|chain| {
                chain
                    .iter()
                    .filter(|e| !e.is_expired(now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a chain for `correlation_id` is still held in memory
    pub fn has_correlation(&self, correlation_id: &str) -> bool {
        self.lock().chains.contains_key(correlation_id)
    }

    /// Most recent non-expired event of exactly `event_type`
    pub fn latest(&self, event_type: &str) -> Option<Arc<Event>> {
        let now = self.inner.clock.now();
        let state = self.lock();
        state
            .history
            .iter()
            .rev()
            .find(|e| e.event_type == event_type && !e.is_expired(now))
            .cloned()
    }

    /// Number of events published with `event_type`
    pub fn event_count(&self, event_type: &str) -> u64 {
        self.lock().event_counts.get(event_type).copied().unwrap_or(0)
    }

    /// Number of handler invocations scheduled for events of `event_type`
    pub fn deliveries(&self, event_type: &str) -> u64 {
        self.lock().deliveries.get(event_type).copied().unwrap_or(0)
    }

    pub fn health(&self) -> BusHealth {
        let now = self.inner.clock.now();
        let threshold = to_time_delta(self.inner.config.stale_threshold);
        let state = self.lock();

        let components = state
            .heartbeats
            .iter()
            .map(|(name, &last_seen)| {
                let status = if now - last_seen < threshold {
                    ComponentStatus::Healthy
                } else {
                    ComponentStatus::Stale
                };
                let health = ComponentHealth {
                    last_seen,
                    status,
                    stats: state.component_stats.get(name).cloned().unwrap_or_default(),
                };
                (name.clone(), health)
            })
            .collect();

        BusHealth {
            active_components: state.heartbeats.len(),
            recent_events: state.history.len(),
            active_correlations: state.chains.len(),
            event_types: state.event_counts.len(),
            total_events_processed: state.total_published,
            subscriptions: state.registry.len(),
            components,
        }
    }

    /// Drop expired events from the history and every chain, deleting chains
    /// left empty. Returns `(expired history events, removed chains)`.
    pub fn expire_events(&self) -> (usize, usize) {
        let now = self.inner.clock.now();
        let mut state = self.lock();

        let before = state.history.len();
        state.history.retain(|e| !e.is_expired(now));
        let expired = before - state.history.len();

        let chains_before = state.chains.len();
        state.chains.retain(|_, chain| {
            chain.retain(|e| !e.is_expired(now));
            !chain.is_empty()
        });
        let removed = chains_before - state.chains.len();

        (expired, removed)
    }

    /// Components whose last publish is at least `stale_threshold` old, sorted
    pub fn stale_components(&self) -> Vec<String> {
        let now = self.inner.clock.now();
        let threshold = to_time_delta(self.inner.config.stale_threshold);
        self.lock()
            .heartbeats
            .iter()
            .filter(|(_, last_seen)| now - **last_seen >= threshold)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Wait (bounded) for queued events to reach the store.
    ///
    /// Returns true when there is no store.
    pub fn flush(&self, timeout: Duration) -> bool {
        match &self.inner.persist {
            Some(persist) => persist.flush(timeout),
            None => true,
        }
    }

    /// A handle that publishes and subscribes as component `name`
    pub fn component(&self, name: impl Into<String>) -> ComponentHandle<C, I> {
        ComponentHandle::new(self.clone(), name.into())
    }

    /// A reference that does not keep the bus alive
    pub fn downgrade(&self) -> WeakEventBus<C, I> {
        WeakEventBus {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Non-owning bus reference for handlers the bus itself stores
pub struct WeakEventBus<C: Clock = SystemClock, I: IdGen = UuidIdGen> {
    inner: Weak<BusInner<C, I>>,
}

impl<C: Clock, I: IdGen> Clone for WeakEventBus<C, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<C: Clock, I: IdGen> WeakEventBus<C, I> {
    pub fn upgrade(&self) -> Option<EventBus<C, I>> {
        self.inner.upgrade().map(|inner| EventBus { inner })
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component handles: publish and subscribe under a component's namespace

use crate::bus::EventBus;
use crate::neural::{CapabilityProfile, PatternDetector};
use crate::periodic::{spawn_periodic, PeriodicJob, ShutdownSignal};
use nerve_core::{BusError, Clock, EventHandler, EventPattern, IdGen, Publish};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Patterns a component follows to hear from the ecosystem itself
const ECOSYSTEM_PATTERNS: [&str; 2] = ["neural.*", "ecosystem.*"];

/// Heartbeats are informational and sent at the lowest priority
const HEARTBEAT_PRIORITY: u8 = 10;

/// A bus view bound to one component name.
///
/// Events published through the handle are typed `"{name}.{subtype}"` and
/// carry the component as their source. A handle with a profile advertises
/// it in every heartbeat.
pub struct ComponentHandle<C: Clock, I: IdGen> {
    bus: EventBus<C, I>,
    name: String,
    profile: Option<CapabilityProfile>,
}

impl<C: Clock, I: IdGen> Clone for ComponentHandle<C, I> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
            name: self.name.clone(),
            profile: self.profile.clone(),
        }
    }
}

impl<C: Clock, I: IdGen> ComponentHandle<C, I> {
    pub(crate) fn new(bus: EventBus<C, I>, name: String) -> Self {
        Self {
            bus,
            name,
            profile: None,
        }
    }

    /// Attach the capabilities this component advertises
    pub fn with_profile(mut self, profile: CapabilityProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Register this component's profile with the detector so it can be
    /// found by `request_help`. A handle without a profile registers an
    /// empty one.
    pub fn register(&self, detector: &PatternDetector<C, I>) -> Result<(), BusError> {
        detector.register_capabilities(&self.name, self.profile.clone().unwrap_or_default())
    }

    pub fn profile(&self) -> Option<&CapabilityProfile> {
        self.profile.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bus(&self) -> &EventBus<C, I> {
        &self.bus
    }

    /// A publish request for `"{name}.{subtype}"`, to be refined further
    pub fn event(&self, subtype: &str) -> Publish {
        Publish::new(format!("{}.{}", self.name, subtype), self.name.clone())
    }

    pub fn publish(&self, subtype: &str, payload: Value) -> Result<String, BusError> {
        self.bus.publish(self.event(subtype).payload(payload))
    }

    pub fn subscribe(
        &self,
        pattern: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<EventPattern, BusError> {
        self.bus.subscribe(pattern, handler, &self.name)
    }

    /// Subscribe to everything under this component's own namespace
    pub fn subscribe_direct(&self, handler: Arc<dyn EventHandler>) -> Result<EventPattern, BusError> {
        self.subscribe(&format!("{}.*", self.name), handler)
    }

    /// Follow `neural.*` and `ecosystem.*`
    pub fn subscribe_ecosystem(
        &self,
        handler: Arc<dyn EventHandler>,
    ) -> Result<Vec<EventPattern>, BusError> {
        self.bus.subscribe_multiple(&ECOSYSTEM_PATTERNS, handler, &self.name)
    }

    pub fn heartbeat(&self) -> Result<String, BusError> {
        let mut payload = json!({"status": "alive"});
        if let Some(profile) = &self.profile {
            payload["capabilities"] = json!(profile);
        }
        self.bus.publish(
            self.event("heartbeat")
                .priority(HEARTBEAT_PRIORITY)
                .payload(payload),
        )
    }

    pub fn shutdown(&self) -> Result<String, BusError> {
        self.publish("shutdown", json!({"reason": "graceful_shutdown"}))
    }

    /// Publish a heartbeat every `interval` until shutdown
    pub fn spawn_heartbeat(&self, interval: Duration, signal: ShutdownSignal) -> JoinHandle<()>
    where
        C: 'static,
        I: 'static,
    {
        spawn_periodic(Heartbeat(self.clone()), interval, signal)
    }
}

struct Heartbeat<C: Clock, I: IdGen>(ComponentHandle<C, I>);

impl<C: Clock + 'static, I: IdGen + 'static> PeriodicJob for Heartbeat<C, I> {
    fn name(&self) -> &'static str {
        "heartbeat"
    }

    fn tick(&mut self) {
        if let Err(e) = self.0.heartbeat() {
            tracing::warn!(component = %self.0.name, error = %e, "heartbeat rejected");
        }
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;

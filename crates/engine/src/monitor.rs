// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health monitor: expiry sweep and stale-component detection

use crate::bus::{EventBus, BUS_SOURCE, STALE_EVENT};
use crate::periodic::{spawn_periodic, PeriodicJob, ShutdownSignal};
use nerve_core::{Clock, HealthConfig, IdGen, Priority, Publish};
use serde_json::json;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_events: usize,
    pub removed_chains: usize,
    pub stale_components: Vec<String>,
}

/// Background health monitor for a bus
pub struct HealthMonitor<C: Clock, I: IdGen> {
    bus: EventBus<C, I>,
    interval: Duration,
}

impl<C: Clock, I: IdGen> HealthMonitor<C, I> {
    pub fn new(bus: EventBus<C, I>, config: &HealthConfig) -> Self {
        Self {
            bus,
            interval: config.interval,
        }
    }

    /// Get the sweep interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run a single sweep.
    ///
    /// Expired events leave memory (the store keeps them). If any component
    /// is stale, a low-priority `ecosystem.components_stale` event lists them.
    pub fn sweep(&self) -> SweepReport {
        let (expired_events, removed_chains) = self.bus.expire_events();
        let stale_components = self.bus.stale_components();

        if !stale_components.is_empty() {
            let published = self.bus.publish(
                Publish::new(STALE_EVENT, BUS_SOURCE)
                    .priority(Priority::LOW.get())
                    .payload(json!({"stale_components": stale_components})),
            );
            if let Err(e) = published {
                tracing::error!(error = %e, "failed to publish stale component report");
            }
        }

        let report = SweepReport {
            expired_events,
            removed_chains,
            stale_components,
        };
        tracing::info!(
            expired = report.expired_events,
            removed_chains = report.removed_chains,
            stale = report.stale_components.len(),
            "health sweep"
        );
        report
    }

    /// Sweep every interval until shutdown
    pub fn spawn(self, signal: ShutdownSignal) -> JoinHandle<()>
    where
        C: 'static,
        I: 'static,
    {
        let interval = self.interval;
        spawn_periodic(self, interval, signal)
    }
}

impl<C: Clock + 'static, I: IdGen + 'static> PeriodicJob for HealthMonitor<C, I> {
    fn name(&self) -> &'static str {
        "health"
    }

    fn tick(&mut self) {
        self.sweep();
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;

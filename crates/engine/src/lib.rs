// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nerve-engine: the event bus and its background services

mod bus;
mod component;
mod dispatch;
mod error;
mod health;
mod monitor;
pub mod neural;
mod periodic;
mod persist;

pub use bus::{BusDeps, EventBus, WeakEventBus, BUS_SOURCE, STALE_EVENT};
pub use component::ComponentHandle;
pub use error::RuleError;
pub use health::{BusHealth, ComponentHealth, ComponentStats, ComponentStatus};
pub use monitor::{HealthMonitor, SweepReport};
pub use neural::{AnalysisReport, CapabilityProfile, PatternDetector, NEURAL_SOURCE};
pub use periodic::{spawn_periodic, PeriodicJob, Shutdown, ShutdownSignal};
pub use persist::PersistWriter;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nerve-core: Core types for the nerve event bus
//!
//! This crate provides:
//! - The immutable `Event` record and the `Publish` request that creates it
//! - Topic patterns, the `EventHandler` capability and the subscription registry
//! - Clock and id abstractions for deterministic tests
//! - Configuration loaded from TOML

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod events;
pub mod id;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BusConfig, ConfigError, HealthConfig, NerveConfig, NeuralConfig, StoreConfig};
pub use error::{BusError, HandlerError};
pub use event::{Event, Payload, Priority, Publish, DEFAULT_TTL_SECONDS};
pub use events::{
    handler_fn, EventHandler, EventPattern, NamedHandler, Subscription, SubscriptionRegistry,
};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription side of the bus
//!
//! This module provides:
//! - `EventPattern` - Exact, prefix and universal topic patterns
//! - `EventHandler` - The capability a subscriber implements
//! - `SubscriptionRegistry` - Pattern-indexed handler lookup

mod handler;
mod registry;
mod subscription;

pub use handler::{handler_fn, EventHandler, NamedHandler};
pub use registry::SubscriptionRegistry;
pub use subscription::{EventPattern, Subscription};

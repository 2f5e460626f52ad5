// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber handler capability

use crate::error::HandlerError;
use crate::event::Event;

/// Something that reacts to events.
///
/// Handlers run inline on whichever thread published the event and must not
/// block indefinitely. Returning an error (or panicking) is logged by the
/// bus and does not affect other handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event) -> Result<(), HandlerError>;

    /// Name used in logs when this handler fails
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> EventHandler for F
where
    F: Fn(&Event) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        self(event)
    }
}

/// A closure handler with an explicit name
pub struct NamedHandler<F> {
    name: String,
    f: F,
}

/// Wrap a closure so it shows up under `name` in logs
pub fn handler_fn<F>(name: impl Into<String>, f: F) -> NamedHandler<F>
where
    F: Fn(&Event) -> Result<(), HandlerError> + Send + Sync,
{
    NamedHandler {
        name: name.into(),
        f,
    }
}

impl<F> EventHandler for NamedHandler<F>
where
    F: Fn(&Event) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        (self.f)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

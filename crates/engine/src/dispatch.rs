// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inline fan-out of events to matching handlers
//!
//! Handlers run on the publishing thread. A handler may publish again, which
//! dispatches recursively; once a thread is `max_depth` levels deep, further
//! fan-outs are queued and the outermost dispatch on that thread drains the
//! queue in FIFO order after its own delivery.

use nerve_core::{Event, Subscription};
use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

struct Fanout {
    event: Arc<Event>,
    subscriptions: Vec<Subscription>,
}

#[derive(Default)]
struct DispatchFrame {
    depth: usize,
    deferred: VecDeque<Fanout>,
}

thread_local! {
    static FRAME: RefCell<DispatchFrame> = RefCell::new(DispatchFrame::default());
}

/// Decrements the thread's dispatch depth when dropped
struct DepthGuard;

impl Drop for DepthGuard {
    fn drop(&mut self) {
        FRAME.with(|frame| {
            let mut frame = frame.borrow_mut();
            frame.depth = frame.depth.saturating_sub(1);
        });
    }
}

/// Deliver `event` to `subscriptions`, or queue it if this thread is already
/// `max_depth` dispatches deep
pub(crate) fn dispatch(event: Arc<Event>, mut subscriptions: Vec<Subscription>, max_depth: usize) {
    let max_depth = max_depth.max(1);

    let admitted = FRAME.with(|frame| {
        let mut frame = frame.borrow_mut();
        if frame.depth >= max_depth {
            frame.deferred.push_back(Fanout {
                event: Arc::clone(&event),
                subscriptions: std::mem::take(&mut subscriptions),
            });
            None
        } else {
            frame.depth += 1;
            Some(frame.depth == 1)
        }
    });

    let Some(outermost) = admitted else {
        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            max_depth,
            "dispatch depth reached, fan-out deferred"
        );
        return;
    };

    let _guard = DepthGuard;
    deliver(&event, &subscriptions);

    if outermost {
        while let Some(next) = FRAME.with(|frame| frame.borrow_mut().deferred.pop_front()) {
            deliver(&next.event, &next.subscriptions);
        }
    }
}

/// Invoke each handler once, isolating errors and panics
pub(crate) fn deliver(event: &Event, subscriptions: &[Subscription]) {
    for sub in subscriptions {
        match panic::catch_unwind(AssertUnwindSafe(|| sub.handler.handle(event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(
                handler = sub.handler.name(),
                component = %sub.component,
                pattern = %sub.pattern,
                event_type = %event.event_type,
                event_id = %event.id,
                error = %e,
                "event handler failed"
            ),
            Err(payload) => tracing::error!(
                handler = sub.handler.name(),
                component = %sub.component,
                pattern = %sub.pattern,
                event_type = %event.event_type,
                event_id = %event.id,
                panic = %panic_message(payload.as_ref()),
                "event handler panicked"
            ),
        }
    }
}

/// Best-effort text of a caught panic
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

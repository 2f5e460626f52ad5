// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic background jobs and the shutdown signal that stops them

use crate::dispatch::panic_message;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Process-wide shutdown trigger
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// A receiver for loops that should stop on shutdown
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal(self.tx.subscribe())
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`]
#[derive(Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once shutdown is triggered or every `Shutdown` is dropped
    pub async fn wait(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Work run on a fixed period until shutdown
pub trait PeriodicJob: Send + 'static {
    fn name(&self) -> &'static str;

    fn tick(&mut self);
}

/// Run `job` every `period` on the tokio runtime.
///
/// The first tick happens one period after spawning. A tick that panics is
/// logged and the loop carries on. On shutdown the loop finishes any tick in
/// progress and returns.
pub fn spawn_periodic<J: PeriodicJob>(
    mut job: J,
    period: Duration,
    mut signal: ShutdownSignal,
) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        tracing::debug!(job = job.name(), ?period, "periodic job started");
        loop {
            tokio::select! {
                biased;
                _ = signal.wait() => break,
                _ = interval.tick() => {
                    let span = tracing::info_span!("periodic", job = job.name());
                    span.in_scope(|| {
                        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| job.tick())) {
                            tracing::error!(
                                job = job.name(),
                                panic = %panic_message(payload.as_ref()),
                                "periodic job panicked"
                            );
                        }
                    });
                }
            }
        }
        tracing::debug!(job = job.name(), "periodic job stopped");
    })
}

#[cfg(test)]
#[path = "periodic_tests.rs"]
mod tests;

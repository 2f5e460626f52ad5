// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background persistence writer
//!
//! Publishing threads hand stored rows to a dedicated thread over a bounded
//! channel and never wait on disk.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use nerve_core::Event;
use nerve_storage::{EventStore, StoredEvent};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

enum Message {
    Persist(StoredEvent),
    Flush(Sender<()>),
}

/// Fire-and-forget writer in front of an event store
pub struct PersistWriter {
    tx: Sender<Message>,
    store: Arc<dyn EventStore>,
}

impl PersistWriter {
    /// Start the writer thread. At most `capacity` rows wait in the queue;
    /// rows submitted beyond that are dropped.
    pub fn spawn(store: Arc<dyn EventStore>, capacity: usize) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        let worker_store = Arc::clone(&store);
        std::thread::Builder::new()
            .name("nerve-persist".to_string())
            .spawn(move || run(worker_store, rx))?;

        Ok(Self { tx, store })
    }

    /// The store rows end up in
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Queue an event for persistence without blocking
    pub fn submit(&self, event: &Event) {
        let record = match StoredEvent::from_event(event) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "cannot encode event for storage");
                return;
            }
        };

        match self.tx.try_send(Message::Persist(record)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(event_id = %event.id, event_type = %event.event_type, "persist queue full, event not stored");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!(event_id = %event.id, "persist writer stopped, event not stored");
            }
        }
    }

    /// Wait until everything queued so far is written and synced.
    ///
    /// Returns false if that did not happen within `timeout`.
    pub fn flush(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        if self.tx.send_timeout(Message::Flush(ack_tx), timeout).is_err() {
            return false;
        }
        let remaining = timeout.saturating_sub(start.elapsed());
        ack_rx.recv_timeout(remaining).is_ok()
    }
}

fn run(store: Arc<dyn EventStore>, rx: Receiver<Message>) {
    tracing::debug!("persist writer started");
    for message in rx {
        match message {
            Message::Persist(record) => {
                let id = record.id.clone();
                if let Err(e) = store.persist(record) {
                    tracing::error!(event_id = %id, error = %e, "failed to persist event");
                }
            }
            Message::Flush(ack) => {
                if let Err(e) = store.sync() {
                    tracing::warn!(error = %e, "failed to sync event store");
                }
                let _ = ack.send(());
            }
        }
    }
    tracing::debug!("persist writer stopped");
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;

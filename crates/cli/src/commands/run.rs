// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nerve run` - run the bus with its background services
//!
//! Publish requests arrive as JSON lines on stdin; the id of each published
//! event is printed on stdout. EOF, SIGINT or SIGTERM shut everything down,
//! flush the store and print a final health summary.

use crate::output::{print, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use nerve_core::{NerveConfig, Publish};
use nerve_engine::{BusDeps, EventBus, HealthMonitor, PatternDetector, PersistWriter, Shutdown};
use nerve_storage::{EventStore, JsonlEventStore, MemoryEventStore};
use serde::Deserialize;
use serde_json::Value;
use std::io::BufRead;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

#[derive(Args)]
pub struct RunArgs {
    /// Format of the final health summary
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// One line of stdin
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PublishRequest {
    #[serde(rename = "type")]
    event_type: String,
    source: String,
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    priority: Option<u8>,
    #[serde(default)]
    correlation_id: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    ttl_seconds: Option<u64>,
}

impl PublishRequest {
    pub(crate) fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    pub(crate) fn into_publish(self) -> Publish {
        let mut request = Publish::new(self.event_type, self.source)
            .maybe_correlation_id(self.correlation_id)
            .tags(self.tags);
        if let Some(payload) = self.payload {
            request = request.payload(payload);
        }
        if let Some(priority) = self.priority {
            request = request.priority(priority);
        }
        if let Some(ttl) = self.ttl_seconds {
            request = request.ttl_seconds(ttl);
        }
        request
    }
}

fn open_store(config: &NerveConfig) -> Result<Arc<dyn EventStore>> {
    match &config.store.path {
        Some(path) => {
            let store = JsonlEventStore::open(path)
                .with_context(|| format!("opening event store {}", path.display()))?;
            tracing::info!(path = %path.display(), events = store.len(), "event store opened");
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!("no store path configured, events are kept in memory");
            Ok(Arc::new(MemoryEventStore::new()))
        }
    }
}

pub async fn run(config: NerveConfig, args: RunArgs) -> Result<()> {
    let store = open_store(&config)?;
    let writer = PersistWriter::spawn(store, config.store.queue_capacity)
        .context("starting persist writer")?;
    let bus = EventBus::with_deps(
        config.bus.clone(),
        BusDeps {
            persist: Some(writer),
            ..BusDeps::default()
        },
    );
    let neural = PatternDetector::attach(&bus, config.neural.clone())?;

    let shutdown = Shutdown::new();
    let jobs = vec![
        HealthMonitor::new(bus.clone(), &config.health).spawn(shutdown.signal()),
        neural.spawn(shutdown.signal()),
    ];

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut lines = spawn_stdin_reader()?;

    tracing::info!("nerve running");
    loop {
        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("interrupted");
                break;
            }
            _ = sigterm.recv() => {
                tracing::info!("terminated");
                break;
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    tracing::info!("stdin closed");
                    break;
                };
                handle_line(&bus, &line.context("reading stdin")?);
            }
        }
    }

    shutdown.trigger();
    for job in jobs {
        if let Err(e) = job.await {
            tracing::error!(error = %e, "background job failed");
        }
    }

    let flushing = bus.clone();
    let timeout = config.store.flush_timeout;
    let flushed = tokio::task::spawn_blocking(move || flushing.flush(timeout)).await?;
    if !flushed {
        tracing::warn!(?timeout, "store flush timed out, recent events may be missing");
    }

    print(&bus.health(), args.format);
    Ok(())
}

/// Forward stdin lines from a dedicated thread.
///
/// A blocking read cannot be cancelled, so the thread is never joined; it
/// dies with the process once `run` returns.
fn spawn_stdin_reader() -> Result<mpsc::Receiver<std::io::Result<String>>> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::Builder::new()
        .name("nerve-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })
        .context("starting stdin reader")?;
    Ok(rx)
}

/// Publish one stdin line, reporting problems on stderr
fn handle_line(bus: &EventBus, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let published = PublishRequest::parse(line)
        .map_err(anyhow::Error::from)
        .and_then(|request| {
            bus.publish(request.into_publish())
                .map_err(anyhow::Error::from)
        });
    match published {
        Ok(id) => println!("{}", id),
        Err(e) => {
            tracing::warn!(error = %e, "rejected publish request");
            eprintln!("error: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

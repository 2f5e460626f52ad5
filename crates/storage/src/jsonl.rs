// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSON-lines event log

use crate::error::StoreError;
use crate::index::EventIndex;
use crate::record::StoredEvent;
use crate::store::EventStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One line of the log
#[derive(Debug, Serialize, Deserialize)]
struct StoreEntry {
    seq: u64,
    op: StoreOp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum StoreOp {
    Insert { event: StoredEvent },
    MarkProcessed { id: String },
}

/// Event store backed by a JSON-lines file.
///
/// Every write is appended to the file before the in-memory indexes change,
/// so the indexes never hold a row the file does not.
pub struct JsonlEventStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    file: File,
    sequence: u64,
    index: EventIndex,
    /// The file ends in a partial line; the next append starts a new one
    torn: bool,
}

impl JsonlEventStore {
    /// Open or create a log at the given path, replaying existing entries
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;
        let torn = ends_mid_line(&mut file)?;
        if torn {
            tracing::warn!(path = %path.display(), "event log ends in a partial line");
        }

        let (sequence, index) = Self::replay(path)?;
        tracing::debug!(path = %path.display(), sequence, events = index.len(), "event log opened");

        Ok(Self::with_file(path, file, sequence, index, torn))
    }

    /// Open an existing log for queries only.
    ///
    /// Nothing is created and the file is never opened for writing, so a
    /// read-only log can be inspected. Writes through this handle fail.
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let (sequence, index) = Self::replay(path)?;
        tracing::debug!(path = %path.display(), sequence, events = index.len(), "event log opened read-only");

        Ok(Self::with_file(path, file, sequence, index, false))
    }

    fn with_file(path: &Path, file: File, sequence: u64, index: EventIndex, torn: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner {
                file,
                sequence,
                index,
                torn,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.lock().sequence
    }

    fn replay(path: &Path) -> Result<(u64, EventIndex), StoreError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((0, EventIndex::default())),
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut index = EventIndex::default();
        let mut sequence = 0;

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: StoreEntry = match serde_json::from_str(&line) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(path = %path.display(), line = lineno + 1, error = %e, "skipping undecodable log entry");
                    continue;
                }
            };
            sequence = sequence.max(entry.seq);

            let applied = match entry.op {
                StoreOp::Insert { event } => index.insert(event),
                StoreOp::MarkProcessed { id } => index.mark_processed(&id),
            };
            if let Err(e) = applied {
                tracing::warn!(path = %path.display(), line = lineno + 1, error = %e, "skipping inconsistent log entry");
            }
        }

        Ok((sequence, index))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Inner {
    fn append(&mut self, op: StoreOp) -> Result<u64, StoreError> {
        let entry = StoreEntry {
            seq: self.sequence + 1,
            op,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        if self.torn {
            line.insert(0, '\n');
        }

        let start = self.file.metadata()?.len();
        if let Err(e) = self.file.write_all(line.as_bytes()) {
            // Cut off whatever part of the line made it to disk
            if let Err(trunc) = self.file.set_len(start) {
                tracing::warn!(error = %trunc, "could not truncate partial log entry");
                self.torn = true;
            }
            return Err(e.into());
        }
        self.torn = false;
        self.sequence = entry.seq;
        Ok(self.sequence)
    }
}

/// Whether a non-empty file lacks a trailing newline
fn ends_mid_line(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

impl EventStore for JsonlEventStore {
    fn persist(&self, record: StoredEvent) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.index.contains(&record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        inner.append(StoreOp::Insert {
            event: record.clone(),
        })?;
        inner.index.insert(record)
    }

    fn mark_processed(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.index.contains(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        inner.append(StoreOp::MarkProcessed { id: id.to_string() })?;
        inner.index.mark_processed(id)
    }

    fn get(&self, id: &str) -> Option<StoredEvent> {
        self.lock().index.get(id).cloned()
    }

    fn by_type(&self, event_type: &str, since: DateTime<Utc>, limit: usize) -> Vec<StoredEvent> {
        self.lock().index.by_type(event_type, since, limit)
    }

    fn by_correlation(&self, correlation_id: &str) -> Vec<StoredEvent> {
        self.lock().index.by_correlation(correlation_id)
    }

    fn recent(&self, limit: usize) -> Vec<StoredEvent> {
        self.lock().index.recent(limit)
    }

    fn len(&self) -> usize {
        self.lock().index.len()
    }

    fn sync(&self) -> Result<(), StoreError> {
        self.lock().file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration for the bus and its background jobs
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Durations use humantime syntax: `"30s"`, `"5m"`, `"7d"`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NerveConfig {
    /// Default log filter when RUST_LOG is unset
    pub log_level: Option<String>,
    /// Write logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
    pub bus: BusConfig,
    pub store: StoreConfig,
    pub health: HealthConfig,
    pub neural: NeuralConfig,
}

impl NerveConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse configuration from TOML text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Event bus settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Capacity of the in-memory ring of recent events
    pub history_capacity: usize,
    /// TTL for events that do not set one
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,
    /// Nesting depth beyond which handler-originated publishes are queued
    pub max_dispatch_depth: usize,
    /// A component that has not published for this long is stale
    #[serde(with = "humantime_serde")]
    pub stale_threshold: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10_000,
            default_ttl: Duration::from_secs(3600),
            max_dispatch_depth: 32,
            stale_threshold: Duration::from_secs(5 * 60),
        }
    }
}

impl BusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth;
        self
    }

    pub fn with_stale_threshold(mut self, threshold: Duration) -> Self {
        self.stale_threshold = threshold;
        self
    }
}

/// Event store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON-lines log file; `None` keeps events in memory only
    pub path: Option<PathBuf>,
    /// Records that may wait for the writer before new ones are dropped
    pub queue_capacity: usize,
    /// Upper bound on waiting for queued writes at shutdown
    #[serde(with = "humantime_serde")]
    pub flush_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            queue_capacity: 1024,
            flush_timeout: Duration::from_secs(5),
        }
    }
}

/// Health monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// How often to sweep expired events and detect stale components
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

impl HealthConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Pattern detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralConfig {
    /// How often to run chain analysis and collaboration optimization
    #[serde(with = "humantime_serde")]
    pub analysis_interval: Duration,
    /// Number of most recent events scanned per analysis pass
    pub analysis_window: usize,
    /// Age limit for collaboration records considered by optimization
    #[serde(with = "humantime_serde")]
    pub optimization_window: Duration,
    /// Minimum recent records before an optimization summary is published
    pub optimization_min_records: usize,
    /// Ordered event-type triples that mark a productive chain
    pub productive_patterns: Vec<[String; 3]>,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            analysis_interval: Duration::from_secs(60),
            analysis_window: 50,
            optimization_window: Duration::from_secs(7 * 24 * 60 * 60),
            optimization_min_records: 5,
            productive_patterns: default_productive_patterns(),
        }
    }
}

impl NeuralConfig {
    pub fn with_analysis_interval(mut self, interval: Duration) -> Self {
        self.analysis_interval = interval;
        self
    }

    pub fn with_productive_patterns(mut self, patterns: Vec<[String; 3]>) -> Self {
        self.productive_patterns = patterns;
        self
    }
}

/// Discovery → analysis → action chains recognised out of the box
pub fn default_productive_patterns() -> Vec<[String; 3]> {
    [
        [
            "aetherius.issue_discovered",
            "akasha.insight_generated",
            "nexus.problem_queued",
        ],
        [
            "mobile.note_added",
            "neural.context_enrichment",
            "akasha.memory_updated",
        ],
        [
            "hive_mind.query_sent",
            "hive_mind.response_generated",
            "neural.knowledge_extracted",
        ],
    ]
    .into_iter()
    .map(|triple| triple.map(String::from))
    .collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

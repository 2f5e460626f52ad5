// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use nerve_core::Payload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a component can do
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityProfile {
    /// Task types the component handles, matched exactly
    pub task_types: BTreeSet<String>,
    /// Free-text descriptions, matched by case-insensitive substring
    pub capabilities: Vec<String>,
}

impl CapabilityProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_types.insert(task_type.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn can_help(&self, task_type: &str) -> bool {
        if self.task_types.contains(task_type) {
            return true;
        }
        let needle = task_type.to_lowercase();
        self.capabilities
            .iter()
            .any(|c| c.to_lowercase().contains(&needle))
    }
}

/// Outcome of a collaboration between components
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollaborationRecord {
    /// Participants, sorted
    pub components: Vec<String>,
    pub task: String,
    pub success: bool,
    pub metrics: Payload,
    pub timestamp: DateTime<Utc>,
}

impl CollaborationRecord {
    /// Key identifying the participant set, e.g. `"a+b"`
    pub fn pattern_key(&self) -> String {
        self.components.join("+")
    }
}

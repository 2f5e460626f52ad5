// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use thiserror::Error;

/// Errors a reactive rule can report while evaluating an event
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("{event_type}: payload field {field} must be {expected}")]
    FieldType {
        event_type: String,
        field: &'static str,
        expected: &'static str,
    },
    #[error("{0}")]
    Failed(String),
}

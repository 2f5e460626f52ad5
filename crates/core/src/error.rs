// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared by the bus and its subscribers

use thiserror::Error;

/// Validation failures surfaced synchronously by publish and subscribe.
///
/// This is the only failure class the bus reports to callers; persistence
/// and handler failures are logged and swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("event type must not be empty")]
    EmptyEventType,
    #[error("event type {0:?} must not contain '*'")]
    WildcardInEventType(String),
    #[error("event source must not be empty")]
    EmptySource,
    #[error("priority {0} is outside 1..=10")]
    InvalidPriority(u8),
    #[error("payload must be a JSON object, got {0}")]
    PayloadNotObject(&'static str),
    #[error("correlation id must not be empty")]
    EmptyCorrelationId,
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },
    #[error("component name must not be empty")]
    EmptyComponent,
}

/// Failure reported by a subscriber handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wrap any error, keeping only its display text
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self::new(error.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reactive rules: per-event reactions of the pattern detector

use crate::bus::EventBus;
use crate::error::RuleError;
use nerve_core::{Clock, Event, IdGen};
use serde_json::{json, Value};
use std::sync::Arc;

/// Read access to recent bus history for rules
pub trait EventLookup {
    /// Most recent non-expired event of exactly `event_type`
    fn latest_of_type(&self, event_type: &str) -> Option<Arc<Event>>;
}

impl<C: Clock, I: IdGen> EventLookup for EventBus<C, I> {
    fn latest_of_type(&self, event_type: &str) -> Option<Arc<Event>> {
        self.latest(event_type)
    }
}

/// A derived event a rule wants published
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub event_type: String,
    pub payload: Value,
}

impl Finding {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// A reaction to one event type.
///
/// Findings are published by the detector with the trigger's correlation id.
pub trait ReactiveRule: Send + Sync {
    fn name(&self) -> &str;

    /// Exact event type this rule reacts to
    fn trigger(&self) -> &str;

    fn evaluate(&self, event: &Event, lookup: &dyn EventLookup)
        -> Result<Option<Finding>, RuleError>;
}

/// The built-in rule set
pub fn default_rules() -> Vec<Box<dyn ReactiveRule>> {
    vec![
        Box::new(ModuleActivationRule::default()),
        Box::new(ContextEnrichmentRule),
        Box::new(KnowledgeExtractionRule),
    ]
}

/// Suggests modules whose keywords appear in a discovered issue
pub struct ModuleActivationRule {
    modules: Vec<(String, Vec<String>)>,
}

impl ModuleActivationRule {
    pub fn new(modules: Vec<(String, Vec<String>)>) -> Self {
        Self { modules }
    }
}

impl Default for ModuleActivationRule {
    fn default() -> Self {
        let table: [(&str, &[&str]); 4] = [
            ("awareness_mod", &["observe", "monitor", "track", "detect"]),
            ("longing_mod", &["goal", "desire", "want", "need"]),
            ("plan_mod", &["plan", "strategy", "approach", "solve"]),
            ("endearment_mod", &["user", "interaction", "relationship"]),
        ];
        Self::new(
            table
                .iter()
                .map(|(module, keywords)| {
                    (
                        module.to_string(),
                        keywords.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl ReactiveRule for ModuleActivationRule {
    fn name(&self) -> &str {
        "module_activation"
    }

    fn trigger(&self) -> &str {
        "aetherius.issue_discovered"
    }

    fn evaluate(
        &self,
        event: &Event,
        _lookup: &dyn EventLookup,
    ) -> Result<Option<Finding>, RuleError> {
        let text = format!(
            "{} {}",
            event.payload_str("title").unwrap_or_default(),
            event.payload_str("description").unwrap_or_default()
        )
        .to_lowercase();

        let suggested: Vec<&str> = self
            .modules
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|(module, _)| module.as_str())
            .collect();
        if suggested.is_empty() {
            return Ok(None);
        }

        Ok(Some(Finding::new(
            "neural.suggest_module_activation",
            json!({
                "issue": event.payload,
                "suggested_modules": suggested,
                "reasoning": "Issue text matches module capabilities",
            }),
        )))
    }
}

/// Attaches a new note to the problem currently being worked on
pub struct ContextEnrichmentRule;

impl ReactiveRule for ContextEnrichmentRule {
    fn name(&self) -> &str {
        "context_enrichment"
    }

    fn trigger(&self) -> &str {
        "mobile.note_added"
    }

    fn evaluate(
        &self,
        event: &Event,
        lookup: &dyn EventLookup,
    ) -> Result<Option<Finding>, RuleError> {
        let Some(problem) = lookup.latest_of_type("nexus.problem_started") else {
            return Ok(None);
        };

        Ok(Some(Finding::new(
            "neural.context_enrichment",
            json!({
                "note": event.payload,
                "problem": problem.payload,
                "suggestion": "Apply note to current problem context",
            }),
        )))
    }
}

const CODE_TAGS: &[&str] = &["code", "solution"];
const ERROR_TAGS: &[&str] = &["error", "fix", "debugging"];

/// Classifies generated responses into reusable knowledge
pub struct KnowledgeExtractionRule;

impl KnowledgeExtractionRule {
    /// `(kind, tags)` for a response, if it looks like reusable knowledge
    pub fn classify(response: &str) -> Option<(&'static str, &'static [&'static str])> {
        if response.contains("def ") || response.contains("class ") {
            return Some(("code_solution", CODE_TAGS));
        }
        let lower = response.to_lowercase();
        if lower.contains("error") && lower.contains("fix") {
            return Some(("error_solution", ERROR_TAGS));
        }
        None
    }
}

impl ReactiveRule for KnowledgeExtractionRule {
    fn name(&self) -> &str {
        "knowledge_extraction"
    }

    fn trigger(&self) -> &str {
        "hive_mind.response_generated"
    }

    fn evaluate(
        &self,
        event: &Event,
        _lookup: &dyn EventLookup,
    ) -> Result<Option<Finding>, RuleError> {
        let response = match event.payload.get("response") {
            None | Some(Value::Null) => "",
            Some(Value::String(s)) => s.as_str(),
            Some(_) => {
                return Err(RuleError::FieldType {
                    event_type: event.event_type.clone(),
                    field: "response",
                    expected: "a string",
                })
            }
        };

        Ok(Self::classify(response).map(|(kind, tags)| {
            Finding::new(
                "neural.knowledge_extracted",
                json!({"type": kind, "content": response, "tags": tags}),
            )
        }))
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pattern detector
//!
//! A privileged `*` subscriber that:
//! - keeps capability registrations and answers help requests
//! - learns which component sets collaborate successfully
//! - runs reactive rules on individual events
//! - periodically scans recent correlation chains for productive patterns

mod analysis;
mod capability;
mod rules;

pub use capability::{CapabilityProfile, CollaborationRecord};
pub use rules::{
    default_rules, ContextEnrichmentRule, EventLookup, Finding, KnowledgeExtractionRule,
    ModuleActivationRule, ReactiveRule,
};

use crate::bus::{EventBus, WeakEventBus};
use crate::dispatch::panic_message;
use crate::periodic::{spawn_periodic, PeriodicJob, ShutdownSignal};
use nerve_core::clock::to_time_delta;
use nerve_core::{
    BusError, Clock, Event, EventHandler, HandlerError, IdGen, NeuralConfig, Payload, Publish,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

/// Source (and subscribing component) of everything the detector publishes
pub const NEURAL_SOURCE: &str = "neural_network";

/// A productive chain found by analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDetection {
    pub correlation_id: String,
    pub pattern: [String; 3],
}

/// Outcome of one analysis pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    /// Chains reported for the first time in this pass
    pub chains_detected: Vec<ChainDetection>,
    /// Successful collaborations per participant set, when an optimization
    /// summary was published
    pub successful_patterns: BTreeMap<String, u64>,
}

#[derive(Default)]
struct NeuralState {
    capabilities: BTreeMap<String, CapabilityProfile>,
    history: Vec<CollaborationRecord>,
    successes: HashMap<String, Vec<CollaborationRecord>>,
    failures: HashMap<String, Vec<CollaborationRecord>>,
    /// `(correlation id, pattern index)` pairs already announced
    reported: HashSet<(String, usize)>,
}

/// Capability registry, collaboration memory and chain analysis for a bus
pub struct PatternDetector<C: Clock, I: IdGen> {
    bus: EventBus<C, I>,
    state: Arc<Mutex<NeuralState>>,
    config: Arc<NeuralConfig>,
}

impl<C: Clock, I: IdGen> Clone for PatternDetector<C, I> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
            state: Arc::clone(&self.state),
            config: Arc::clone(&self.config),
        }
    }
}

impl<C: Clock, I: IdGen> PatternDetector<C, I> {
    /// Subscribe to every event with the built-in reactive rules
    pub fn attach(bus: &EventBus<C, I>, config: NeuralConfig) -> Result<Self, BusError>
    where
        C: 'static,
        I: 'static,
    {
        Self::attach_with_rules(bus, config, default_rules())
    }

    pub fn attach_with_rules(
        bus: &EventBus<C, I>,
        config: NeuralConfig,
        rules: Vec<Box<dyn ReactiveRule>>,
    ) -> Result<Self, BusError>
    where
        C: 'static,
        I: 'static,
    {
        let observer = RuleObserver {
            bus: bus.downgrade(),
            rules: Arc::from(rules),
        };
        bus.subscribe("*", Arc::new(observer), NEURAL_SOURCE)?;

        Ok(Self {
            bus: bus.clone(),
            state: Arc::new(Mutex::new(NeuralState::default())),
            config: Arc::new(config),
        })
    }

    fn lock(&self) -> MutexGuard<'_, NeuralState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, request: Publish) {
        let event_type = request.event_type().to_string();
        if let Err(e) = self.bus.publish(request) {
            tracing::error!(event_type = %event_type, error = %e, "detector failed to publish");
        }
    }

    /// Record what `component` can do, replacing any earlier registration
    pub fn register_capabilities(
        &self,
        component: &str,
        profile: CapabilityProfile,
    ) -> Result<(), BusError> {
        if component.is_empty() {
            return Err(BusError::EmptyComponent);
        }
        let payload = json!({"component": component, "capabilities": profile});
        self.lock().capabilities.insert(component.to_string(), profile);

        tracing::info!(component, "capabilities registered");
        self.publish(Publish::new("neural.component_registered", NEURAL_SOURCE).payload(payload));
        Ok(())
    }

    /// Components other than `requester` able to help with `task_type`, in
    /// name order
    pub fn request_help(&self, requester: &str, task_type: &str, context: &Payload) -> Vec<String> {
        let helpers: Vec<String> = self
            .lock()
            .capabilities
            .iter()
            .filter(|(name, profile)| name.as_str() != requester && profile.can_help(task_type))
            .map(|(name, _)| name.clone())
            .collect();

        let correlation_id = context
            .get("correlation_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        self.publish(
            Publish::new("neural.help_requested", NEURAL_SOURCE)
                .payload(json!({
                    "requesting_component": requester,
                    "task_type": task_type,
                    "context": context,
                    "suggested_helpers": helpers,
                }))
                .maybe_correlation_id(correlation_id),
        );
        helpers
    }

    /// Remember how a collaboration went
    pub fn learn_collaboration_outcome(
        &self,
        components: &[&str],
        task: &str,
        success: bool,
        metrics: Payload,
    ) -> CollaborationRecord {
        let mut components: Vec<String> = components.iter().map(|c| c.to_string()).collect();
        components.sort();
        let record = CollaborationRecord {
            components,
            task: task.to_string(),
            success,
            metrics,
            timestamp: self.bus.clock().now(),
        };

        {
            let mut state = self.lock();
            state.history.push(record.clone());
            let filed = if success {
                &mut state.successes
            } else {
                &mut state.failures
            };
            filed.entry(task.to_string()).or_default().push(record.clone());
        }

        tracing::debug!(task, success, components = ?record.components, "collaboration learned");
        self.publish(
            Publish::new("neural.collaboration_learned", NEURAL_SOURCE).payload(json!(record)),
        );
        record
    }

    /// The most recent successful component set for `task`, falling back to
    /// capability matching
    pub fn suggest_collaboration(&self, task: &str, context: &Payload) -> Vec<String> {
        let known = self.lock().successes.get(task).and_then(|records| {
            records
                .iter()
                .max_by_key(|r| r.timestamp)
                .map(|r| r.components.clone())
        });

        match known {
            Some(components) => components,
            None => self.request_help(NEURAL_SOURCE, task, context),
        }
    }

    /// Failed collaborations recorded for `task`
    pub fn failures(&self, task: &str) -> Vec<CollaborationRecord> {
        self.lock().failures.get(task).cloned().unwrap_or_default()
    }

    /// Scan recent chains for productive patterns and summarize successful
    /// collaborations
    pub fn analyze(&self) -> AnalysisReport {
        let chains_detected = self.detect_chains();
        let successful_patterns = self.optimize_collaborations();

        if !chains_detected.is_empty() || !successful_patterns.is_empty() {
            tracing::info!(
                chains = chains_detected.len(),
                patterns = successful_patterns.len(),
                "pattern analysis"
            );
        }
        AnalysisReport {
            chains_detected,
            successful_patterns,
        }
    }

    fn detect_chains(&self) -> Vec<ChainDetection> {
        let events = self.bus.recent_events(None, self.config.analysis_window);
        let patterns = &self.config.productive_patterns;
        let mut detected = Vec::new();

        for (correlation_id, chain) in analysis::group_by_correlation(&events) {
            if chain.len() < 2 {
                continue;
            }
            let Some(index) = analysis::matching_pattern(&chain, patterns) else {
                continue;
            };
            let Some(pattern) = patterns.get(index) else {
                continue;
            };
            let fresh = self.lock().reported.insert((correlation_id.clone(), index));
            if !fresh {
                continue;
            }

            let chain_events: Vec<&Event> = chain.iter().map(|e| e.as_ref()).collect();
            self.publish(
                Publish::new("neural.intelligence_chain_detected", NEURAL_SOURCE)
                    .payload(json!({
                        "pattern_matched": pattern,
                        "correlation_id": correlation_id,
                        "events": chain_events,
                        "intelligence_chain": true,
                        "suggestion": "This chain shows productive cross-component intelligence",
                    }))
                    .correlation_id(correlation_id.clone()),
            );
            detected.push(ChainDetection {
                correlation_id,
                pattern: pattern.clone(),
            });
        }

        let reported: Vec<String> = self
            .lock()
            .reported
            .iter()
            .map(|(id, _)| id.clone())
            .collect();
        let gone: HashSet<String> = reported
            .into_iter()
            .filter(|id| !self.bus.has_correlation(id))
            .collect();
        if !gone.is_empty() {
            self.lock().reported.retain(|(id, _)| !gone.contains(id));
        }

        detected
    }

    fn optimize_collaborations(&self) -> BTreeMap<String, u64> {
        let now = self.bus.clock().now();
        let cutoff = now.checked_sub_signed(to_time_delta(self.config.optimization_window));

        let counts = {
            let state = self.lock();
            let recent: Vec<&CollaborationRecord> = state
                .history
                .iter()
                .filter(|r| match cutoff {
                    Some(cutoff) => r.timestamp > cutoff,
                    None => true,
                })
                .collect();
            if recent.len() < self.config.optimization_min_records {
                return BTreeMap::new();
            }
            analysis::success_counts(recent)
        };

        if !counts.is_empty() {
            self.publish(
                Publish::new("neural.collaboration_optimization", NEURAL_SOURCE).payload(json!({
                    "successful_patterns": counts,
                    "recommendation": "Prioritize these component combinations",
                })),
            );
        }
        counts
    }

    /// Analyze every `analysis_interval` until shutdown
    pub fn spawn(&self, signal: ShutdownSignal) -> JoinHandle<()>
    where
        C: 'static,
        I: 'static,
    {
        spawn_periodic(self.clone(), self.config.analysis_interval, signal)
    }
}

impl<C: Clock + 'static, I: IdGen + 'static> PeriodicJob for PatternDetector<C, I> {
    fn name(&self) -> &'static str {
        "neural"
    }

    fn tick(&mut self) {
        self.analyze();
    }
}

/// The detector's `*` subscription: runs reactive rules on each event
struct RuleObserver<C: Clock, I: IdGen> {
    bus: WeakEventBus<C, I>,
    rules: Arc<[Box<dyn ReactiveRule>]>,
}

impl<C: Clock, I: IdGen> EventHandler for RuleObserver<C, I> {
    fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        let Some(bus) = self.bus.upgrade() else {
            return Ok(());
        };

        for rule in self.rules.iter().filter(|r| r.trigger() == event.event_type) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(event, &bus)));
            let finding = match outcome {
                Ok(Ok(Some(finding))) => finding,
                Ok(Ok(None)) => continue,
                Ok(Err(e)) => {
                    tracing::error!(rule = rule.name(), event_type = %event.event_type, event_id = %event.id, error = %e, "reactive rule failed");
                    continue;
                }
                Err(payload) => {
                    tracing::error!(rule = rule.name(), event_type = %event.event_type, event_id = %event.id, panic = %panic_message(payload.as_ref()), "reactive rule panicked");
                    continue;
                }
            };

            tracing::debug!(rule = rule.name(), finding = %finding.event_type, trigger = %event.id, "rule fired");
            let published = bus.publish(
                Publish::new(finding.event_type, NEURAL_SOURCE)
                    .payload(finding.payload)
                    .correlation_id(event.correlation_id.clone()),
            );
            if let Err(e) = published {
                tracing::error!(rule = rule.name(), error = %e, "rule finding rejected");
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "neural_network.rules"
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests through the public engine API
//!
//! These wire a bus, the pattern detector, the health monitor and a JSONL
//! store together the way the `nerve` binary does.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use nerve_core::{
    handler_fn, BusConfig, Event, HealthConfig, NeuralConfig, Publish, SystemClock, UuidIdGen,
};
use nerve_engine::{
    BusDeps, CapabilityProfile, EventBus, HealthMonitor, PatternDetector, PersistWriter,
    NEURAL_SOURCE, STALE_EVENT,
};
use nerve_storage::{EventStore, JsonlEventStore};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn productive_patterns() -> Vec<[String; 3]> {
    vec![[
        "issue.discovered".to_string(),
        "insight.generated".to_string(),
        "work.queued".to_string(),
    ]]
}

#[test]
fn cross_component_chain_is_detected_once() {
    let bus = EventBus::new(BusConfig::default());
    let neural = PatternDetector::attach(
        &bus,
        NeuralConfig::default().with_productive_patterns(productive_patterns()),
    )
    .unwrap();

    let detections = Arc::new(Mutex::new(Vec::new()));
    let seen = detections.clone();
    bus.subscribe(
        "neural.*",
        Arc::new(handler_fn("watcher", move |e: &Event| {
            if e.event_type == "neural.intelligence_chain_detected" {
                seen.lock().unwrap().push(e.clone());
            }
            Ok(())
        })),
        "watcher",
    )
    .unwrap();

    for (event_type, source) in [
        ("issue.discovered", "svcA"),
        ("insight.generated", "svcB"),
        ("work.queued", "svcC"),
    ] {
        bus.publish(Publish::new(event_type, source).correlation_id("c1"))
            .unwrap();
    }

    neural.analyze();
    neural.analyze();

    let detections = detections.lock().unwrap();
    assert_eq!(detections.len(), 1);
    let detection = &detections[0];
    assert_eq!(detection.source, NEURAL_SOURCE);
    assert_eq!(detection.correlation_id, "c1");

    let sources: Vec<&str> = detection.payload["events"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["source"].as_str())
        .collect();
    assert_eq!(sources, ["svcA", "svcB", "svcC"]);
}

#[test]
fn components_cooperate_through_the_bus() {
    let bus = EventBus::new(BusConfig::default());
    let neural = PatternDetector::attach(&bus, NeuralConfig::default()).unwrap();
    neural
        .register_capabilities(
            "reviewer",
            CapabilityProfile::new().with_capability("code review"),
        )
        .unwrap();

    let reviewer = bus.component("reviewer");
    let replies = reviewer.clone();
    reviewer
        .subscribe(
            "planner.review_requested",
            Arc::new(handler_fn("review", move |e: &Event| {
                replies
                    .bus()
                    .publish(
                        replies
                            .event("review_done")
                            .correlation_id(e.correlation_id.clone())
                            .payload(json!({"approved": true})),
                    )
                    .map(|_| ())
                    .map_err(|err| nerve_core::HandlerError::from_error(&err))
            })),
        )
        .unwrap();

    let helpers = neural.request_help("planner", "review", &Default::default());
    assert_eq!(helpers, ["reviewer"]);

    let planner = bus.component("planner");
    bus.publish(planner.event("review_requested").correlation_id("pr-7"))
        .unwrap();

    let chain: Vec<String> = bus
        .correlation_chain("pr-7")
        .iter()
        .map(|e| e.event_type.clone())
        .collect();
    assert_eq!(chain, ["planner.review_requested", "reviewer.review_done"]);
    assert!(bus.stale_components().is_empty());
}

#[test]
fn events_persist_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("events.jsonl");

    {
        let store = Arc::new(JsonlEventStore::open(&path).unwrap());
        let bus = EventBus::with_deps(
            BusConfig::default(),
            BusDeps::<SystemClock, UuidIdGen> {
                persist: Some(PersistWriter::spawn(store, 64).unwrap()),
                ..BusDeps::default()
            },
        );
        for n in 0..3 {
            bus.publish(
                Publish::new("job.finished", "runner")
                    .correlation_id("batch-1")
                    .payload(json!({"n": n})),
            )
            .unwrap();
        }
        assert!(bus.flush(Duration::from_secs(5)));
    }

    let store = JsonlEventStore::open(&path).unwrap();
    let records = store.by_correlation("batch-1");
    assert_eq!(records.len(), 3);
    let numbers: Vec<i64> = records
        .iter()
        .map(|r| r.payload_value().unwrap()["n"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, [0, 1, 2]);
}

#[test]
fn quiet_monitor_reports_nothing() {
    let bus = EventBus::new(BusConfig::default());
    bus.component("worker").heartbeat().unwrap();

    let report = HealthMonitor::new(bus.clone(), &HealthConfig::default()).sweep();
    assert!(report.stale_components.is_empty());
    assert_eq!(bus.event_count(STALE_EVENT), 0);
    assert_eq!(bus.health().active_components, 1);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use nerve_core::{handler_fn, FakeClock, HandlerError, SequentialIdGen};
use nerve_storage::{EventStore, MemoryEventStore};
use serde_json::json;

type TestBus = EventBus<FakeClock, SequentialIdGen>;

fn test_bus(config: BusConfig) -> (TestBus, FakeClock) {
    let clock = FakeClock::new();
    let bus = EventBus::with_deps(
        config,
        BusDeps {
            clock: clock.clone(),
            ids: SequentialIdGen::new("evt"),
            persist: None,
        },
    );
    (bus, clock)
}

type Log = Arc<Mutex<Vec<String>>>;

/// Handler that records `"{tag}:{event type}"`
fn recorder(log: &Log, tag: &str) -> Arc<dyn EventHandler> {
    let log = Arc::clone(log);
    let label = tag.to_string();
    Arc::new(handler_fn(tag, move |e: &Event| {
        log.lock().unwrap().push(format!("{}:{}", label, e.event_type));
        Ok(())
    }))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn publish_assigns_unique_ids_and_fresh_correlation() {
    let (bus, _) = test_bus(BusConfig::default());

    let a = bus.publish(Publish::new("orders.created", "shop")).unwrap();
    let b = bus.publish(Publish::new("orders.created", "shop")).unwrap();
    assert_ne!(a, b);

    let recent = bus.recent_events(None, 10);
    assert_eq!(recent.len(), 2);
    let chain = bus.correlation_chain(&recent[0].correlation_id);
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].id, a);
}

#[test]
fn supplied_correlation_groups_events() {
    let (bus, _) = test_bus(BusConfig::default());

    for source in ["svcA", "svcB", "svcC"] {
        bus.publish(Publish::new("step.done", source).correlation_id("c1"))
            .unwrap();
    }

    let chain = bus.correlation_chain("c1");
    let sources: Vec<&str> = chain.iter().map(|e| e.source.as_str()).collect();
    assert_eq!(sources, ["svcA", "svcB", "svcC"]);
    assert!(bus.has_correlation("c1"));
    assert!(bus.correlation_chain("nope").is_empty());
}

#[test]
fn prefix_pattern_matches_namespace_only() {
    let (bus, _) = test_bus(BusConfig::default());
    let log = Log::default();
    bus.subscribe("orders.*", recorder(&log, "orders"), "audit")
        .unwrap();

    bus.publish(Publish::new("orders.created", "shop")).unwrap();
    bus.publish(Publish::new("billing.created", "shop")).unwrap();

    assert_eq!(entries(&log), ["orders:orders.created"]);
}

#[test]
fn wildcard_receives_every_event_once() {
    let (bus, _) = test_bus(BusConfig::default());
    let log = Log::default();
    bus.subscribe("*", recorder(&log, "all"), "audit").unwrap();

    bus.publish(Publish::new("orders.created", "shop")).unwrap();
    bus.publish(Publish::new("billing.created", "shop")).unwrap();

    assert_eq!(
        entries(&log),
        ["all:orders.created", "all:billing.created"]
    );
}

#[test]
fn handler_runs_once_per_matching_pattern() {
    let (bus, _) = test_bus(BusConfig::default());
    let log = Log::default();
    let handler = recorder(&log, "multi");
    bus.subscribe_multiple(&["orders.created", "orders.*"], handler, "audit")
        .unwrap();

    bus.publish(Publish::new("orders.created", "shop")).unwrap();

    assert_eq!(entries(&log).len(), 2);
    assert_eq!(bus.deliveries("orders.created"), 2);
}

#[test]
fn subscribe_multiple_registers_nothing_on_bad_pattern() {
    let (bus, _) = test_bus(BusConfig::default());
    let log = Log::default();

    let err = bus
        .subscribe_multiple(&["orders.*", "or*ders"], recorder(&log, "x"), "audit")
        .unwrap_err();
    assert!(matches!(err, BusError::InvalidPattern { .. }));
    assert_eq!(bus.health().subscriptions, 0);
}

#[test]
fn ttl_expiry_hides_then_sweeps_events() {
    let (bus, clock) = test_bus(BusConfig::default());

    bus.publish(
        Publish::new("flash.sale", "shop")
            .ttl_seconds(1)
            .correlation_id("c-ttl"),
    )
    .unwrap();

    clock.advance(Duration::from_millis(500));
    assert_eq!(bus.recent_events(None, 10).len(), 1);

    clock.advance(Duration::from_millis(1500));
    assert!(bus.recent_events(None, 10).is_empty());
    assert!(bus.correlation_chain("c-ttl").is_empty());

    let (expired, removed) = bus.expire_events();
    assert_eq!((expired, removed), (1, 1));
    assert!(!bus.has_correlation("c-ttl"));
    assert_eq!(bus.health().recent_events, 0);
}

#[test]
fn expiry_keeps_live_events_in_a_chain() {
    let (bus, clock) = test_bus(BusConfig::default());

    bus.publish(Publish::new("a", "svc").correlation_id("c").ttl_seconds(1))
        .unwrap();
    bus.publish(Publish::new("b", "svc").correlation_id("c").ttl_seconds(60))
        .unwrap();

    clock.advance(Duration::from_secs(2));
    assert_eq!(bus.expire_events(), (1, 0));

    let chain = bus.correlation_chain("c");
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].event_type, "b");
}

#[test]
fn recent_events_filters_before_limiting() {
    let (bus, _) = test_bus(BusConfig::default());
    for event_type in ["a", "b", "a", "b", "a", "b", "b"] {
        bus.publish(Publish::new(event_type, "svc")).unwrap();
    }

    let only_a = bus.recent_events(Some("a"), 2);
    assert_eq!(only_a.len(), 2);
    assert!(only_a.iter().all(|e| e.event_type == "a"));

    let all_a = bus.recent_events(Some("a"), 10);
    assert_eq!(all_a.len(), 3);
    assert_eq!(all_a[1].id, only_a[0].id);
    assert_eq!(all_a[2].id, only_a[1].id);

    let tail = bus.recent_events(None, 2);
    assert_eq!(tail.len(), 2);
    assert!(tail[0].created_at <= tail[1].created_at);
}

#[test]
fn history_is_bounded() {
    let (bus, _) = test_bus(BusConfig::default().with_history_capacity(3));
    for n in 0..5 {
        bus.publish(Publish::new("tick", "svc").payload(json!({"n": n})))
            .unwrap();
    }

    let recent = bus.recent_events(None, 100);
    let ns: Vec<i64> = recent
        .iter()
        .filter_map(|e| e.payload.get("n").and_then(|n| n.as_i64()))
        .collect();
    assert_eq!(ns, [2, 3, 4]);
    assert_eq!(bus.health().total_events_processed, 5);
}

#[test]
fn health_reports_stale_then_healthy() {
    let (bus, clock) = test_bus(BusConfig::default());
    bus.publish(Publish::new("svcA.ready", "svcA")).unwrap();

    let health = bus.health();
    assert_eq!(health.components["svcA"].status, ComponentStatus::Healthy);

    clock.advance(Duration::from_secs(5 * 60));
    let health = bus.health();
    assert_eq!(health.components["svcA"].status, ComponentStatus::Stale);
    assert_eq!(bus.stale_components(), ["svcA"]);

    bus.publish(Publish::new("svcA.ready", "svcA")).unwrap();
    let health = bus.health();
    assert_eq!(health.components["svcA"].status, ComponentStatus::Healthy);
    assert!(bus.stale_components().is_empty());
}

#[test]
fn health_counts_components_types_and_stats() {
    let (bus, _) = test_bus(BusConfig::default());
    let log = Log::default();
    bus.subscribe("orders.*", recorder(&log, "a"), "audit").unwrap();
    bus.subscribe("billing.*", recorder(&log, "b"), "audit").unwrap();

    bus.publish(Publish::new("orders.created", "shop")).unwrap();
    bus.publish(Publish::new("orders.paid", "shop")).unwrap();
    bus.publish(Publish::new("billing.created", "ledger").correlation_id("x"))
        .unwrap();

    let health = bus.health();
    assert_eq!(health.active_components, 2);
    assert_eq!(health.recent_events, 3);
    assert_eq!(health.active_correlations, 3);
    assert_eq!(health.event_types, 3);
    assert_eq!(health.total_events_processed, 3);
    assert_eq!(health.subscriptions, 2);
    assert_eq!(health.components["shop"].stats.events_published, 2);
    assert_eq!(bus.event_count("orders.created"), 1);

    // subscribing alone does not make a component active
    assert!(!health.components.contains_key("audit"));

    let summary = health.to_string();
    assert!(summary.starts_with("events: 3 processed, 3 in memory"));
    assert!(summary.contains("\n  shop                     healthy  published=2"));
}

#[test]
fn failing_and_panicking_handlers_are_isolated() {
    let (bus, _) = test_bus(BusConfig::default());
    let log = Log::default();

    bus.subscribe(
        "job.*",
        Arc::new(handler_fn("fails", |_: &Event| {
            Err(HandlerError::new("boom"))
        })),
        "flaky",
    )
    .unwrap();
    bus.subscribe(
        "job.*",
        Arc::new(handler_fn("panics", |_: &Event| -> Result<(), HandlerError> {
            panic!("handler bug")
        })),
        "flaky",
    )
    .unwrap();
    bus.subscribe("job.*", recorder(&log, "steady"), "steady")
        .unwrap();

    let id = bus.publish(Publish::new("job.done", "worker"));
    assert!(id.is_ok());
    assert_eq!(entries(&log), ["steady:job.done"]);
}

#[test]
fn handler_can_publish_reentrantly() {
    let (bus, _) = test_bus(BusConfig::default());
    let log = Log::default();
    let weak = bus.downgrade();

    bus.subscribe(
        "ping",
        Arc::new(handler_fn("responder", move |e: &Event| {
            if let Some(bus) = weak.upgrade() {
                bus.publish(Publish::new("pong", "responder").correlation_id(e.correlation_id.clone()))
                    .map_err(|e| HandlerError::from_error(&e))?;
            }
            Ok(())
        })),
        "responder",
    )
    .unwrap();
    bus.subscribe("pong", recorder(&log, "seen"), "audit").unwrap();

    bus.publish(Publish::new("ping", "client").correlation_id("c1"))
        .unwrap();

    assert_eq!(entries(&log), ["seen:pong"]);
    let types: Vec<String> = bus
        .correlation_chain("c1")
        .iter()
        .map(|e| e.event_type.clone())
        .collect();
    assert_eq!(types, ["ping", "pong"]);
}

#[test]
fn fanout_beyond_depth_limit_is_deferred_not_lost() {
    let (bus, _) = test_bus(BusConfig::default().with_max_dispatch_depth(2));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let weak = bus.downgrade();
    let record = Arc::clone(&seen);

    bus.subscribe(
        "step",
        Arc::new(handler_fn("stepper", move |e: &Event| {
            let n = e.payload.get("n").and_then(|n| n.as_u64()).unwrap_or(0);
            record.lock().unwrap().push(n);
            if n < 5 {
                if let Some(bus) = weak.upgrade() {
                    bus.publish(Publish::new("step", "stepper").payload(json!({"n": n + 1})))
                        .map_err(|e| HandlerError::from_error(&e))?;
                }
            }
            Ok(())
        })),
        "stepper",
    )
    .unwrap();

    bus.publish(Publish::new("step", "client").payload(json!({"n": 0})))
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), [0, 1, 2, 3, 4, 5]);
    assert_eq!(bus.event_count("step"), 6);
}

#[test]
fn invalid_publish_is_rejected_and_not_recorded() {
    let (bus, _) = test_bus(BusConfig::default());

    assert_eq!(
        bus.publish(Publish::new("", "svc")),
        Err(BusError::EmptyEventType)
    );
    assert!(matches!(
        bus.publish(Publish::new("orders.*", "svc")),
        Err(BusError::WildcardInEventType(_))
    ));
    assert_eq!(
        bus.publish(Publish::new("a", "svc").priority(0)),
        Err(BusError::InvalidPriority(0))
    );
    assert!(bus.recent_events(None, 10).is_empty());
    assert_eq!(bus.health().active_components, 0);
}

#[test]
fn subscribe_rejects_empty_component() {
    let (bus, _) = test_bus(BusConfig::default());
    let log = Log::default();
    assert_eq!(
        bus.subscribe("a", recorder(&log, "x"), ""),
        Err(BusError::EmptyComponent)
    );
}

#[test]
fn events_reach_the_store() {
    let store = Arc::new(MemoryEventStore::new());
    let persist = PersistWriter::spawn(store.clone(), 16).unwrap();
    let bus = EventBus::with_deps(
        BusConfig::default(),
        BusDeps {
            clock: FakeClock::new(),
            ids: SequentialIdGen::new("evt"),
            persist: Some(persist),
        },
    );

    let id = bus
        .publish(
            Publish::new("orders.created", "shop")
                .payload(json!({"order": 7}))
                .tag("vip"),
        )
        .unwrap();
    assert!(bus.flush(Duration::from_secs(5)));

    let row = store.get(&id).unwrap();
    assert_eq!(row.event_type, "orders.created");
    assert_eq!(row.payload_value().unwrap()["order"], 7);
    assert_eq!(row.tag_list().unwrap(), ["vip"]);
    assert!(!row.processed);
}

#[test]
fn flush_without_store_is_immediate() {
    let (bus, _) = test_bus(BusConfig::default());
    assert!(bus.flush(Duration::ZERO));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use nerve_core::{Clock, FakeClock, Publish, SequentialIdGen};
use serde_json::json;
use std::time::Duration;

fn event() -> Event {
    Publish::new("orders.created", "checkout")
        .payload(json!({"order": 42, "items": ["a", "b"]}))
        .priority(3)
        .correlation_id("c1")
        .tags(["billing", "audit"])
        .build(
            &SequentialIdGen::new("evt"),
            FakeClock::new().now(),
            Duration::from_secs(60),
        )
        .unwrap()
}

#[test]
fn from_event_serializes_payload_and_tags_as_text() {
    let event = event();
    let row = StoredEvent::from_event(&event).unwrap();

    assert_eq!(row.id, event.id);
    assert_eq!(row.event_type, "orders.created");
    assert_eq!(row.source, "checkout");
    assert_eq!(row.priority, 3);
    assert_eq!(row.correlation_id, "c1");
    assert!(!row.processed);
    assert_eq!(row.payload_value().unwrap(), event.payload);
    assert_eq!(row.tag_list().unwrap(), vec!["audit", "billing"]);
}

#[test]
fn row_uses_type_key_on_the_wire() {
    let row = StoredEvent::from_event(&event()).unwrap();
    let value = serde_json::to_value(&row).unwrap();

    assert_eq!(value["type"], "orders.created");
    assert!(value.get("event_type").is_none());
    assert_eq!(value["processed"], false);
}

#[test]
fn processed_defaults_to_false_when_missing() {
    let mut value = serde_json::to_value(StoredEvent::from_event(&event()).unwrap()).unwrap();
    value.as_object_mut().unwrap().remove("processed");

    let row: StoredEvent = serde_json::from_value(value).unwrap();
    assert!(!row.processed);
}

#[test]
fn display_is_one_line() {
    let mut row = StoredEvent::from_event(&event()).unwrap();
    let text = row.to_string();
    assert!(text.contains("orders.created"));
    assert!(text.contains("correlation=c1"));
    assert!(!text.contains('\n'));

    row.processed = true;
    assert!(row.to_string().contains(" processed "));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use accord_core::{FakeClock, HubEvent};

#[tokio::test]
async fn frames_carry_type_data_and_timestamp() {
    let bus = EventBus::new();
    let clock = FakeClock::new();
    clock.set_epoch_ms(123_456);
    let mut frames = attach_json_bridge(&bus, clock);

    bus.emit(&HubEvent::RequestClaimed {
        request_id: "req-1".into(),
        service: "backend".to_string(),
        attempt: 1,
    });

    let frame = frames.recv().await.unwrap();
    assert_eq!(frame.frame_type, "request:claimed");
    assert_eq!(frame.timestamp, 123_456);
    assert_eq!(frame.data["request_id"], "req-1");
    assert_eq!(frame.data["service"], "backend");
    // The tag lives in the envelope, not the payload
    assert!(frame.data.get("type").is_none());

    let wire = serde_json::to_value(&frame).unwrap();
    assert_eq!(wire["type"], "request:claimed");
    assert_eq!(wire["data"]["attempt"], 1);
}

#[tokio::test]
async fn dropped_consumer_does_not_break_emission() {
    let bus = EventBus::new();
    let frames = attach_json_bridge(&bus, FakeClock::new());
    drop(frames);

    // Emission still works with the receiver gone
    bus.emit(&HubEvent::ServiceAdded {
        service: "backend".to_string(),
    });
}

#[tokio::test]
async fn frames_preserve_event_order() {
    let bus = EventBus::new();
    let mut frames = attach_json_bridge(&bus, FakeClock::new());

    for service in ["a", "b", "c"] {
        bus.emit(&HubEvent::ServiceAdded {
            service: service.to_string(),
        });
    }
    for expected in ["a", "b", "c"] {
        let frame = frames.recv().await.unwrap();
        assert_eq!(frame.data["service"], expected);
    }
}

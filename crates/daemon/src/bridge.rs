// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON bridge: serialize bus events into frames for external consumers.
//!
//! The bridge never lets a bad consumer abort emission: serialization
//! failures are logged and dropped, and a closed receiver just means the
//! frames go nowhere.

use accord_core::{Clock, EventBus};
use serde::Serialize;
use tokio::sync::mpsc;

/// One event, framed for the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub data: serde_json::Value,
    pub timestamp: u64,
}

/// Subscribe a frame producer to the bus.
///
/// Every published event arrives on the returned receiver as a
/// `{type, data, timestamp}` frame.
pub fn attach_json_bridge<C: Clock>(
    bus: &EventBus,
    clock: C,
) -> mpsc::UnboundedReceiver<EventFrame> {
    let (tx, rx) = mpsc::unbounded_channel();
    bus.subscribe(move |event| {
        let mut value = match serde_json::to_value(event) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize event for bridge");
                return;
            }
        };
        let frame_type = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("unknown")
            .to_string();
        if let Some(object) = value.as_object_mut() {
            object.remove("type");
        }
        let _ = tx.send(EventFrame {
            frame_type,
            data: value,
            timestamp: clock.epoch_ms(),
        });
    });
    rx
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;

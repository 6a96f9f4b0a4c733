// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service watching: announce inbox directories coming and going.
//!
//! Services register by gaining an inbox under `comms/inbox/`; operators
//! remove them by deleting it. The watcher diffs the directory set after
//! every scheduler tick and publishes `service:added` / `service:removed`.

use accord_core::{EventBus, HubEvent};
use accord_store::HubLayout;
use parking_lot::Mutex;
use std::collections::BTreeSet;

fn inbox_services(layout: &HubLayout) -> BTreeSet<String> {
    let Ok(entries) = std::fs::read_dir(layout.inbox_root()) else {
        return BTreeSet::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}

/// Subscribe the watcher to the bus.
///
/// `initial` seeds the known set so startup does not re-announce the
/// configured services.
pub fn attach_service_watcher(bus: &EventBus, layout: HubLayout, initial: BTreeSet<String>) {
    let known = Mutex::new(initial);
    let watcher_bus = bus.clone();
    bus.subscribe(move |event| {
        if !matches!(event, HubEvent::SchedulerTick { .. }) {
            return;
        }
        let current = inbox_services(&layout);
        let mut known = known.lock();
        for service in current.difference(&known) {
            tracing::info!(service, "service inbox appeared");
            watcher_bus.emit(&HubEvent::ServiceAdded {
                service: service.clone(),
            });
        }
        for service in known.difference(&current) {
            tracing::info!(service, "service inbox removed");
            watcher_bus.emit(&HubEvent::ServiceRemoved {
                service: service.clone(),
            });
        }
        *known = current;
    });
}

#[cfg(test)]
#[path = "services_tests.rs"]
mod tests;

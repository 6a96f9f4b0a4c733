// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous in-process event fan-out.
//!
//! Handlers run in the publisher's context, in subscription order, with no
//! intrinsic async. Consumers that need to do real work forward events into
//! their own channel from the handler.

use crate::event::HubEvent;
use parking_lot::Mutex;
use std::sync::Arc;

type Handler = Arc<dyn Fn(&HubEvent) + Send + Sync>;

/// Clonable handle to the hub's event bus.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<Mutex<Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every published event.
    ///
    /// Handlers must not block; they execute inline on the publishing task.
    pub fn subscribe(&self, handler: impl Fn(&HubEvent) + Send + Sync + 'static) {
        self.handlers.lock().push(Arc::new(handler));
    }

    /// Publish an event to all handlers, FIFO per handler.
    ///
    /// The handler list is snapshotted first so a handler may subscribe
    /// without deadlocking; late subscribers see the next event.
    pub fn emit(&self, event: &HubEvent) {
        let handlers: Vec<Handler> = self.handlers.lock().clone();
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;

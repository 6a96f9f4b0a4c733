// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared engine context.
//!
//! Everything the workers need travels in one explicit value instead of
//! process globals: layout, config, bus, clock, and the adapter seams.

use crate::session_manager::SessionManager;
use accord_adapters::{AgentBackend, SyncTransport};
use accord_core::{Clock, EventBus, HubConfig};
use accord_store::{HistoryLog, HubLayout};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Dependency bundle shared by the dispatcher, workers, and scheduler.
pub struct HubContext<A, T, C: Clock> {
    pub layout: HubLayout,
    pub config: HubConfig,
    pub bus: EventBus,
    pub clock: C,
    pub backend: A,
    pub sync: T,
    pub sessions: SessionManager<C>,
    pub history: HistoryLog,
    /// Serializes sync-transport operations on the hub working tree;
    /// concurrent git processes on one tree corrupt each other.
    pub sync_gate: tokio::sync::Mutex<()>,
}

impl<A, T, C> HubContext<A, T, C>
where
    A: AgentBackend,
    T: SyncTransport,
    C: Clock,
{
    pub fn new(
        layout: HubLayout,
        config: HubConfig,
        bus: EventBus,
        clock: C,
        backend: A,
        sync: T,
    ) -> Self {
        let sessions =
            SessionManager::new(&layout, config.dispatch.rotation_policy(), clock.clone());
        let history = HistoryLog::new(layout.history_dir());
        Self {
            layout,
            config,
            bus,
            clock,
            backend,
            sync,
            sessions,
            history,
            sync_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Working directory for a service under the configured repo model.
    pub fn service_dir(&self, service: &str) -> PathBuf {
        self.config.service_dir(service, self.layout.root())
    }

    /// Current time as a timestamp, driven by the context clock.
    pub fn now_ts(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.clock.epoch_ms() as i64)
            .unwrap_or_else(Utc::now)
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session manager: live agent sessions keyed by service name.
//!
//! Sessions are a soft optimization. Disk I/O failures on load/save are
//! logged and swallowed; losing the map only costs resumption, never
//! correctness.

use accord_core::{Clock, RequestId, RotationPolicy, RotationReason, SessionRecord};
use accord_store::{CheckpointStore, HubLayout};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct SessionManager<C: Clock> {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    policy: RotationPolicy,
    sessions_path: PathBuf,
    checkpoints: CheckpointStore,
    clock: C,
}

impl<C: Clock> SessionManager<C> {
    /// Create a manager, restoring any persisted session map.
    pub fn new(layout: &HubLayout, policy: RotationPolicy, clock: C) -> Self {
        let sessions_path = layout.sessions_file();
        let sessions = match accord_store::load_sessions(&sessions_path) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = %e, "could not restore session map, starting empty");
                HashMap::new()
            }
        };
        Self {
            sessions: Mutex::new(sessions),
            policy,
            sessions_path,
            checkpoints: CheckpointStore::new(layout.checkpoints_dir()),
            clock,
        }
    }

    pub fn get(&self, service: &str) -> Option<SessionRecord> {
        self.sessions.lock().get(service).cloned()
    }

    pub fn has_session(&self, service: &str) -> bool {
        self.sessions.lock().contains_key(service)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Register a use of `session_id` for `service`, creating the record
    /// if absent. Returns `true` when a new record was created.
    pub fn record_use(&self, service: &str, session_id: &str) -> bool {
        let now_ms = self.clock.epoch_ms();
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(service) {
            Some(record) => {
                record.record_use(session_id, now_ms);
                false
            }
            None => {
                sessions.insert(
                    service.to_string(),
                    SessionRecord::new(service, session_id, now_ms),
                );
                true
            }
        }
    }

    /// Whether the service's session hit a rotation cap.
    pub fn should_rotate(&self, service: &str) -> Option<RotationReason> {
        let sessions = self.sessions.lock();
        let record = sessions.get(service)?;
        self.policy.due(record, self.clock.epoch_ms())
    }

    /// Delete the session record; the next invoke starts fresh.
    pub fn rotate(&self, service: &str) -> Option<SessionRecord> {
        self.sessions.lock().remove(service)
    }

    /// Persist the map. Failures are logged, not raised.
    pub fn save(&self) {
        let snapshot = self.sessions.lock().clone();
        if let Err(e) = accord_store::save_sessions(&self.sessions_path, &snapshot) {
            tracing::warn!(error = %e, "could not persist session map");
        }
    }

    pub fn write_checkpoint(&self, request_id: &RequestId, text: &str) {
        if let Err(e) = self.checkpoints.write(request_id, text) {
            tracing::warn!(request_id = %request_id, error = %e, "could not write checkpoint");
        }
    }

    pub fn read_checkpoint(&self, request_id: &RequestId) -> Option<String> {
        self.checkpoints.read(request_id)
    }

    pub fn clear_checkpoint(&self, request_id: &RequestId) {
        if let Err(e) = self.checkpoints.clear(request_id) {
            tracing::warn!(request_id = %request_id, error = %e, "could not clear checkpoint");
        }
    }

    pub fn checkpoint_exists(&self, request_id: &RequestId) -> bool {
        self.checkpoints.exists(request_id)
    }
}

#[cfg(test)]
#[path = "session_manager_tests.rs"]
mod tests;

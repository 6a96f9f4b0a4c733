// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path helpers for the hub directory tree.

use std::path::{Path, PathBuf};

/// The well-known layout under a hub root.
///
/// ```text
/// comms/inbox/{service}/req-*.md   requests
/// comms/archive/*.md               terminal requests
/// comms/history/*.jsonl            history records
/// comms/sessions/*.session.md      crash checkpoints
/// directives/*.md                  directives
/// contracts/, registry/            collaborator-owned content
/// config.yaml                      hub config
/// .agent-sessions.json             persisted session map
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubLayout {
    root: PathBuf,
}

/// Inbox reserved for escalations and operator traffic.
pub const ORCHESTRATOR_SERVICE: &str = "orchestrator";

impl HubLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn comms_dir(&self) -> PathBuf {
        self.root.join("comms")
    }

    pub fn inbox_root(&self) -> PathBuf {
        self.comms_dir().join("inbox")
    }

    pub fn service_inbox(&self, service: &str) -> PathBuf {
        self.inbox_root().join(service)
    }

    pub fn orchestrator_inbox(&self) -> PathBuf {
        self.service_inbox(ORCHESTRATOR_SERVICE)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.comms_dir().join("archive")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.comms_dir().join("history")
    }

    /// Crash-checkpoint directory (`*.session.md` files).
    pub fn checkpoints_dir(&self) -> PathBuf {
        self.comms_dir().join("sessions")
    }

    pub fn directives_dir(&self) -> PathBuf {
        self.root.join("directives")
    }

    pub fn contracts_dir(&self) -> PathBuf {
        self.root.join("contracts")
    }

    pub fn registry_dir(&self) -> PathBuf {
        self.root.join("registry")
    }

    pub fn registry_file(&self, service: &str) -> PathBuf {
        self.registry_dir().join(format!("{service}.yaml"))
    }

    pub fn skills_index(&self) -> PathBuf {
        self.root.join("skills").join("INDEX.md")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    pub fn sessions_file(&self) -> PathBuf {
        self.root.join(".agent-sessions.json")
    }

    /// Create the directories the hub writes into.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            self.inbox_root(),
            self.orchestrator_inbox(),
            self.archive_dir(),
            self.history_dir(),
            self.checkpoints_dir(),
            self.directives_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;

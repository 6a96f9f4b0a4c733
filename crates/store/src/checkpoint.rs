// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash checkpoints: failure context carried into the next attempt.
//!
//! One text file per request id in `comms/sessions/`. A checkpoint exists
//! exactly while the request's last invoke failed and the request is not
//! yet terminal.

use crate::codec::write_atomic;
use crate::StoreError;
use accord_core::RequestId;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, request_id: &RequestId) -> PathBuf {
        self.dir.join(format!("{request_id}.session.md"))
    }

    pub fn write(&self, request_id: &RequestId, text: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        write_atomic(&self.path(request_id), text)
    }

    /// Read a checkpoint; absent means `None`.
    pub fn read(&self, request_id: &RequestId) -> Option<String> {
        std::fs::read_to_string(self.path(request_id)).ok()
    }

    /// Remove a checkpoint. Removing a missing checkpoint is not an error.
    pub fn clear(&self, request_id: &RequestId) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path(request_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, request_id: &RequestId) -> bool {
        self.path(request_id).exists()
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake sync transport for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SyncError, SyncTransport};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded call to FakeSync
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCall {
    Pull(PathBuf),
    Push(PathBuf),
    Clone { url: String, target: PathBuf },
    Commit { dir: PathBuf, message: String },
}

struct FakeSyncState {
    calls: Vec<SyncCall>,
    fail_pull: bool,
    fail_push: bool,
    commit_result: bool,
}

/// Fake sync transport: records calls, optionally fails.
#[derive(Clone)]
pub struct FakeSync {
    inner: Arc<Mutex<FakeSyncState>>,
}

impl Default for FakeSync {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSync {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSyncState {
                calls: Vec::new(),
                fail_pull: false,
                fail_push: false,
                commit_result: true,
            })),
        }
    }

    pub fn fail_pull(&self) {
        self.inner.lock().fail_pull = true;
    }

    pub fn fail_push(&self) {
        self.inner.lock().fail_push = true;
    }

    /// Make subsequent commits report "nothing to commit".
    pub fn nothing_to_commit(&self) {
        self.inner.lock().commit_result = false;
    }

    pub fn calls(&self) -> Vec<SyncCall> {
        self.inner.lock().calls.clone()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SyncCall::Commit { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn pull_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, SyncCall::Pull(_)))
            .count()
    }

    pub fn push_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, SyncCall::Push(_)))
            .count()
    }
}

#[async_trait]
impl SyncTransport for FakeSync {
    async fn pull(&self, dir: &Path) -> Result<(), SyncError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SyncCall::Pull(dir.to_path_buf()));
        if inner.fail_pull {
            return Err(SyncError::Command {
                op: "git pull",
                message: "remote unreachable".to_string(),
            });
        }
        Ok(())
    }

    async fn push(&self, dir: &Path) -> Result<(), SyncError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SyncCall::Push(dir.to_path_buf()));
        if inner.fail_push {
            return Err(SyncError::Command {
                op: "git push",
                message: "remote unreachable".to_string(),
            });
        }
        Ok(())
    }

    async fn clone_repo(&self, url: &str, target: &Path) -> Result<(), SyncError> {
        self.inner.lock().calls.push(SyncCall::Clone {
            url: url.to_string(),
            target: target.to_path_buf(),
        });
        Ok(())
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<bool, SyncError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SyncCall::Commit {
            dir: dir.to_path_buf(),
            message: message.to_string(),
        });
        Ok(inner.commit_result)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

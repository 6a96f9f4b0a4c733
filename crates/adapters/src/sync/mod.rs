// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync transport: how hub state moves between machines.
//!
//! The hub only needs four operations; everything else about version
//! control stays outside the core. Pull and push failures are logged by
//! callers and never abort request processing.

mod git;

pub use git::GitSync;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSync, SyncCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{op} failed: {message}")]
    Command { op: &'static str, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport for the hub working tree.
#[async_trait]
pub trait SyncTransport: Clone + Send + Sync + 'static {
    /// Fetch remote changes into `dir`.
    async fn pull(&self, dir: &Path) -> Result<(), SyncError>;

    /// Publish local commits from `dir`. Implementations retry at least
    /// three times before giving up.
    async fn push(&self, dir: &Path) -> Result<(), SyncError>;

    /// Clone `url` into `target`.
    async fn clone_repo(&self, url: &str, target: &Path) -> Result<(), SyncError>;

    /// Commit everything in `dir`. Returns `false` when there was nothing
    /// to commit; that is not an error.
    async fn commit(&self, dir: &Path, message: &str) -> Result<bool, SyncError>;
}

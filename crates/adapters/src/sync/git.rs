// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git CLI sync transport.

use super::{SyncError, SyncTransport};
use crate::subprocess::{run_with_timeout, GIT_CLONE_TIMEOUT, GIT_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Attempts made before a push is reported as failed.
const PUSH_ATTEMPTS: u32 = 3;

/// Pause between push attempts.
const PUSH_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Sync transport shelling out to `git`.
#[derive(Debug, Clone, Default)]
pub struct GitSync;

impl GitSync {
    pub fn new() -> Self {
        Self
    }

    async fn git(
        dir: &Path,
        args: &[&str],
        op: &'static str,
        timeout: Duration,
    ) -> Result<Output, SyncError> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(dir);
        let output = run_with_timeout(cmd, timeout, op)
            .await
            .map_err(|message| SyncError::Command { op, message })?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(SyncError::Command {
                op,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl SyncTransport for GitSync {
    async fn pull(&self, dir: &Path) -> Result<(), SyncError> {
        Self::git(dir, &["pull", "--no-rebase"], "git pull", GIT_TIMEOUT).await?;
        Ok(())
    }

    async fn push(&self, dir: &Path) -> Result<(), SyncError> {
        let mut last = None;
        for attempt in 1..=PUSH_ATTEMPTS {
            match Self::git(dir, &["push"], "git push", GIT_TIMEOUT).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "git push attempt failed");
                    last = Some(e);
                    if attempt < PUSH_ATTEMPTS {
                        tokio::time::sleep(PUSH_RETRY_DELAY).await;
                    }
                }
            }
        }
        Err(last.unwrap_or(SyncError::Command {
            op: "git push",
            message: "no attempts made".to_string(),
        }))
    }

    async fn clone_repo(&self, url: &str, target: &Path) -> Result<(), SyncError> {
        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;
        let target_str = target.to_string_lossy();
        Self::git(
            parent,
            &["clone", url, &target_str],
            "git clone",
            GIT_CLONE_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<bool, SyncError> {
        Self::git(dir, &["add", "-A"], "git add", GIT_TIMEOUT).await?;

        let mut cmd = Command::new("git");
        cmd.args(["commit", "-m", message]).current_dir(dir);
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git commit")
            .await
            .map_err(|message| SyncError::Command {
                op: "git commit",
                message,
            })?;

        if output.status.success() {
            return Ok(true);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stdout.contains("nothing to commit") || stderr.contains("nothing to commit") {
            return Ok(false);
        }
        Err(SyncError::Command {
            op: "git commit",
            message: stderr.trim().to_string(),
        })
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;

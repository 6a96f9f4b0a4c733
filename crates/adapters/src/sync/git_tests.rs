// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

async fn init_repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    for args in [
        vec!["init", "--initial-branch", "main"],
        vec!["config", "user.email", "hub@example.test"],
        vec!["config", "user.name", "Hub"],
    ] {
        let status = tokio::process::Command::new("git")
            .args(&args)
            .current_dir(tmp.path())
            .output()
            .await
            .unwrap();
        assert!(status.status.success(), "git {args:?} failed");
    }
    tmp
}

#[tokio::test]
async fn commit_reports_whether_anything_changed() {
    let repo = init_repo().await;
    let sync = GitSync::new();

    std::fs::write(repo.path().join("req-1.md"), "content\n").unwrap();
    assert!(sync.commit(repo.path(), "claim request req-1").await.unwrap());

    // Nothing changed since: not an error, just false
    assert!(!sync.commit(repo.path(), "noop").await.unwrap());
}

#[tokio::test]
async fn pull_outside_a_repo_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let err = GitSync::new().pull(tmp.path()).await.unwrap_err();
    assert!(matches!(err, SyncError::Command { op: "git pull", .. }));
}

#[tokio::test]
async fn clone_from_a_local_repo() {
    let source = init_repo().await;
    std::fs::write(source.path().join("seed.md"), "seed\n").unwrap();
    GitSync::new()
        .commit(source.path(), "seed")
        .await
        .unwrap();

    let dest_root = TempDir::new().unwrap();
    let target = dest_root.path().join("clone");
    GitSync::new()
        .clone_repo(&source.path().to_string_lossy(), &target)
        .await
        .unwrap();

    assert!(target.join("seed.md").exists());
}

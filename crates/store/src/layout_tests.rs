// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn paths_hang_off_the_root() {
    let layout = HubLayout::new("/hub");
    assert_eq!(layout.service_inbox("backend"), PathBuf::from("/hub/comms/inbox/backend"));
    assert_eq!(layout.orchestrator_inbox(), PathBuf::from("/hub/comms/inbox/orchestrator"));
    assert_eq!(layout.archive_dir(), PathBuf::from("/hub/comms/archive"));
    assert_eq!(layout.history_dir(), PathBuf::from("/hub/comms/history"));
    assert_eq!(layout.checkpoints_dir(), PathBuf::from("/hub/comms/sessions"));
    assert_eq!(layout.directives_dir(), PathBuf::from("/hub/directives"));
    assert_eq!(layout.registry_file("backend"), PathBuf::from("/hub/registry/backend.yaml"));
    assert_eq!(layout.config_path(), PathBuf::from("/hub/config.yaml"));
    assert_eq!(layout.sessions_file(), PathBuf::from("/hub/.agent-sessions.json"));
}

#[test]
fn ensure_dirs_creates_the_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = HubLayout::new(tmp.path());
    layout.ensure_dirs().unwrap();

    assert!(layout.inbox_root().is_dir());
    assert!(layout.orchestrator_inbox().is_dir());
    assert!(layout.archive_dir().is_dir());
    assert!(layout.history_dir().is_dir());
    assert!(layout.checkpoints_dir().is_dir());
    assert!(layout.directives_dir().is_dir());

    // Idempotent
    layout.ensure_dirs().unwrap();
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle scenarios.

use crate::prelude::*;
use accord_adapters::FakeAgentBackend;
use accord_core::{HubEvent, RotationReason};

#[tokio::test]
async fn sessions_resume_and_rotate_at_the_request_cap() {
    let hub = hub_with_backend(
        FakeAgentBackend::with_session_ids(&["s1", "s2", "s3"]),
        |config| {
            config.dispatch.session_max_requests = 2;
        },
    );

    // Three successive requests for the same service
    hub.place(pending("req-1", "backend"));
    assert_eq!(hub.tick().await, 1);
    hub.place(pending("req-2", "backend"));
    assert_eq!(hub.tick().await, 1);
    hub.place(pending("req-3", "backend"));
    assert_eq!(hub.tick().await, 1);

    let calls = hub.backend.calls();
    assert_eq!(calls.len(), 3);
    // First call starts fresh, second resumes s1
    assert_eq!(calls[0].resume_session_id, None);
    assert_eq!(calls[1].resume_session_id.as_deref(), Some("s1"));
    // Before the third invoke the manager rotated: no resume id
    assert_eq!(calls[2].resume_session_id, None);

    // The rotation was announced
    assert!(hub.events().iter().any(|event| matches!(
        event,
        HubEvent::SessionRotated {
            session_id,
            reason: RotationReason::RequestCount,
            ..
        } if session_id == "s2"
    )));

    // The persisted map holds the fresh session, not the rotated one
    let persisted = accord_store::load_sessions(&hub.layout().sessions_file()).unwrap();
    assert_eq!(persisted["backend"].session_id, "s3");
    assert_eq!(persisted["backend"].request_count, 1);
}

#[tokio::test]
async fn session_map_survives_a_restart() {
    let hub = hub(|_| {});
    hub.place(pending("req-1", "backend"));
    hub.tick().await;

    // A new context over the same hub dir restores the map from disk
    let restored = accord_engine::SessionManager::new(
        hub.layout(),
        hub.ctx.config.dispatch.rotation_policy(),
        hub.clock.clone(),
    );
    assert_eq!(restored.get("backend").unwrap().session_id, "fake-session");
}

#[tokio::test]
async fn distinct_services_keep_distinct_sessions() {
    let hub = hub_with_backend(FakeAgentBackend::with_session_ids(&["sa", "sb"]), |config| {
        config.repo_model = accord_core::RepoModel::MultiRepo;
    });
    hub.place(pending("req-a", "backend"));
    hub.place(pending("req-b", "frontend"));

    hub.tick().await;

    let sessions = accord_store::load_sessions(&hub.layout().sessions_file()).unwrap();
    assert_eq!(sessions.len(), 2);
    assert_ne!(
        sessions["backend"].session_id,
        sessions["frontend"].session_id
    );
}

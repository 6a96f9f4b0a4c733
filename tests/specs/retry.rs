// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry and escalation scenarios.

use crate::prelude::*;
use accord_adapters::FakeAgentBackend;
use accord_core::{HubEvent, Priority, RequestStatus};

#[tokio::test]
async fn failing_request_retries_then_escalates() {
    let hub = hub_with_backend(FakeAgentBackend::failing_with("timeout"), |config| {
        config.dispatch.max_attempts = 2;
    });
    hub.place(
        accord_core::test_support::RequestBuilder::new("req-doomed", "backend")
            .body("Migrate the database.\n")
            .build(),
    );

    // First tick: failure, back to pending with one attempt on the books
    assert_eq!(hub.tick().await, 1);
    let inbox = hub.inbox_of("backend");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].status(), RequestStatus::Pending);
    assert_eq!(inbox[0].header.attempts, 1);
    assert!(hub.ctx.sessions.checkpoint_exists(&"req-doomed".into()));

    // Second tick: budget exhausted, failed and escalated
    assert_eq!(hub.tick().await, 1);
    let archived = hub.archive();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].status(), RequestStatus::Failed);
    assert_eq!(archived[0].header.attempts, 2);

    let escalations = hub.inbox_of("orchestrator");
    assert_eq!(escalations.len(), 1);
    let escalation = &escalations[0];
    assert!(escalation
        .id()
        .as_str()
        .starts_with("req-escalation-backend-"));
    assert_eq!(escalation.priority(), Priority::High);
    assert_eq!(
        escalation.header.originated_from.as_deref(),
        Some("req-doomed")
    );
    assert!(escalation.body.contains("Migrate the database."));
    assert!(escalation.body.contains("timeout"));

    // Checkpoint is gone once the request is terminal
    assert!(!hub.ctx.sessions.checkpoint_exists(&"req-doomed".into()));

    // Failure events: first with retry, then without
    let retries: Vec<bool> = hub
        .events()
        .into_iter()
        .filter_map(|event| match event {
            HubEvent::RequestFailed { will_retry, .. } => Some(will_retry),
            _ => None,
        })
        .collect();
    assert_eq!(retries, vec![true, false]);
}

#[tokio::test]
async fn attempts_survive_the_pending_oscillation() {
    let hub = hub_with_backend(FakeAgentBackend::failing_with("flaky"), |config| {
        config.dispatch.max_attempts = 3;
    });
    hub.place(pending("req-fragile", "backend"));

    for expected_attempts in 1..=2u32 {
        hub.tick().await;
        let inbox = hub.inbox_of("backend");
        assert_eq!(inbox[0].header.attempts, expected_attempts);
        assert_eq!(inbox[0].status(), RequestStatus::Pending);
    }

    hub.tick().await;
    assert_eq!(hub.archive()[0].status(), RequestStatus::Failed);
    assert_eq!(hub.archive()[0].header.attempts, 3);
}

#[tokio::test]
async fn recovery_after_one_failure_completes_normally() {
    let backend = FakeAgentBackend::new();
    backend.push_failure("transient blip");
    let hub = hub_with_backend(backend, |_| {});
    hub.place(pending("req-bumpy", "backend"));

    hub.tick().await;
    assert_eq!(hub.inbox_of("backend")[0].header.attempts, 1);

    // Next tick succeeds; the prompt carried the checkpoint
    hub.tick().await;
    assert_eq!(hub.archive()[0].status(), RequestStatus::Completed);
    let second_prompt = &hub.backend.calls()[1].prompt;
    assert!(second_prompt.contains("## Previous attempt"));
    assert!(second_prompt.contains("transient blip"));
    assert!(!hub.ctx.sessions.checkpoint_exists(&"req-bumpy".into()));
    assert!(hub.inbox_of("orchestrator").is_empty());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch exclusivity and ordering scenarios.

use crate::prelude::*;
use accord_core::test_support::RequestBuilder;
use accord_core::{RepoModel, RequestStatus};

#[tokio::test]
async fn monorepo_serializes_services_sharing_the_hub_dir() {
    let hub = hub(|config| {
        config.dispatch.workers = 4;
    });
    hub.place(pending("req-backend", "backend"));
    hub.place(pending("req-frontend", "frontend"));

    // Both services share the hub working directory: one at a time
    assert_eq!(hub.tick().await, 1);
    assert_eq!(hub.archive().len(), 1);
    let remaining = hub.inbox();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].status(), RequestStatus::Pending);

    // Second tick picks up the other one
    assert_eq!(hub.tick().await, 1);
    assert_eq!(hub.archive().len(), 2);
    assert!(hub.inbox().is_empty());

    // Every tick pulled, every processing batch committed and pushed
    assert_eq!(hub.sync.pull_count(), 2);
    assert!(hub
        .sync
        .commit_messages()
        .contains(&"dispatcher processed 1 request(s)".to_string()));
    assert_eq!(hub.sync.push_count(), 2);
}

#[tokio::test]
async fn multi_repo_processes_both_in_one_tick() {
    let hub = hub(|config| {
        config.repo_model = RepoModel::MultiRepo;
        config.dispatch.workers = 4;
    });
    hub.place(pending("req-backend", "backend"));
    hub.place(pending("req-frontend", "frontend"));

    assert_eq!(hub.tick().await, 2);
    assert_eq!(hub.archive().len(), 2);
    assert!(hub.inbox().is_empty());
    assert_eq!(hub.backend.invocation_count(), 2);
}

#[tokio::test]
async fn same_priority_ties_break_by_creation_time() {
    let hub = hub(|config| {
        config.dispatch.workers = 1;
    });
    hub.place(
        RequestBuilder::new("req-newer", "backend")
            .created_ms(5_000)
            .build(),
    );
    hub.place(
        RequestBuilder::new("req-older", "backend")
            .created_ms(1_000)
            .build(),
    );

    assert_eq!(hub.tick().await, 1);

    let archived = hub.archive();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id().as_str(), "req-older");
    assert_eq!(hub.inbox()[0].id().as_str(), "req-newer");
}

#[tokio::test]
async fn dependencies_gate_dispatch_until_completion() {
    let hub = hub(|_| {});
    hub.place(
        RequestBuilder::new("req-dependent", "backend")
            .depends_on(&["req-upstream"])
            .build(),
    );
    hub.place(pending("req-upstream", "frontend"));

    // First tick can only run the upstream request (shared dir anyway)
    assert_eq!(hub.tick().await, 1);
    assert_eq!(hub.archive()[0].id().as_str(), "req-upstream");

    // Now the dependency is completed-in-archive: dependent runs
    assert_eq!(hub.tick().await, 1);
    assert_eq!(hub.archive().len(), 2);
}

#[tokio::test]
async fn scheduler_tick_reports_counts() {
    let hub = hub(|_| {});
    hub.place(pending("req-a", "backend"));
    hub.place(pending("req-b", "frontend"));

    hub.tick().await;

    let tick = hub
        .events()
        .into_iter()
        .find_map(|event| match event {
            accord_core::HubEvent::SchedulerTick {
                pending_count,
                processed_count,
                ..
            } => Some((pending_count, processed_count)),
            _ => None,
        })
        .unwrap();
    // Two were pending, the shared directory admitted one
    assert_eq!(tick, (2, 1));
}

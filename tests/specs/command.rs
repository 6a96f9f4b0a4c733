// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command fast-path scenarios.

use crate::prelude::*;
use accord_core::test_support::RequestBuilder;
use accord_core::RequestStatus;

#[tokio::test]
async fn command_request_completes_in_one_tick() {
    let hub = hub(|_| {});
    hub.place(
        RequestBuilder::new("req-cmd-status", "backend")
            .command("status")
            .build(),
    );

    let processed = hub.tick().await;
    assert_eq!(processed, 1);

    // File landed in the archive with a Result section
    let archived = hub.archive();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id().as_str(), "req-cmd-status");
    assert_eq!(archived[0].status(), RequestStatus::Completed);
    let text = std::fs::read_to_string(&archived[0].path).unwrap();
    assert!(text.contains("## Result"));
    assert!(text.contains("```"));

    // Inbox is empty again
    assert!(hub.inbox().is_empty());

    // Last history entry records the completion under the service actor
    let day = hub.ctx.now_ts().date_naive();
    let entries = hub.ctx.history.read_day(day, "backend").unwrap();
    let last = entries.last().unwrap();
    assert_eq!(last.to_status, RequestStatus::Completed);
    assert_eq!(last.actor, "backend");

    // The raw log is line-delimited JSON with one object per transition
    let raw = std::fs::read_to_string(hub.ctx.history.path_for(day, "backend")).unwrap();
    for line in raw.lines() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["request_id"], "req-cmd-status");
    }

    // No agent involved
    assert_eq!(hub.backend.invocation_count(), 0);
}

#[tokio::test]
async fn invalid_command_still_archives_but_reports_failure() {
    let hub = hub(|_| {});
    hub.place(
        RequestBuilder::new("req-cmd-nope", "backend")
            .command("frobnicate")
            .build(),
    );

    hub.tick().await;

    let archived = hub.archive();
    assert_eq!(archived.len(), 1);
    let text = std::fs::read_to_string(&archived[0].path).unwrap();
    assert!(text.contains("unknown command: frobnicate"));
}

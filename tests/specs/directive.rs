// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directive coordination scenarios.

use crate::prelude::*;
use accord_core::test_support::{DirectiveBuilder, RequestBuilder};
use accord_core::{DirectivePhase, FakeClock, HubEvent, RequestStatus};
use accord_engine::Coordinator;
use accord_store::{directive_path, parse_directive, write_directive, write_request};
use std::sync::Arc;

struct DirectiveHub {
    hub: SpecHub,
    coordinator: Coordinator<FakeClock>,
}

fn directive_hub() -> DirectiveHub {
    let hub = hub(|config| {
        config.coordination.test_agent_service = Some("qa".to_string());
    });
    let coordinator = Coordinator::new(
        hub.layout().clone(),
        hub.ctx.config.clone(),
        hub.ctx.bus.clone(),
        hub.clock.clone(),
    );
    DirectiveHub { hub, coordinator }
}

impl DirectiveHub {
    fn seed_directive(&self, directive: accord_core::Directive) {
        let mut directive = directive;
        directive.path = directive_path(self.hub.layout(), directive.id());
        write_directive(&directive).unwrap();
    }

    /// Mark a request as settled the way the worker leaves it: terminal
    /// in the archive, live otherwise.
    fn settle(&self, id: &str, service: &str, status: RequestStatus) {
        let _ = std::fs::remove_file(
            self.hub
                .layout()
                .service_inbox(service)
                .join(format!("{id}.md")),
        );
        let request = RequestBuilder::new(id, service).status(status).build();
        let dir = if status.is_terminal() {
            self.hub.layout().archive_dir()
        } else {
            self.hub.layout().service_inbox(service)
        };
        write_request(
            &dir.join(format!("{id}.md")),
            &request.header,
            &request.body,
        )
        .unwrap();
        self.coordinator.on_request_settled(&id.into());
    }

    fn phase(&self, id: &str) -> DirectivePhase {
        parse_directive(&directive_path(self.hub.layout(), &id.into()))
            .unwrap()
            .phase()
    }

    fn reload(&self, id: &str) -> accord_core::Directive {
        parse_directive(&directive_path(self.hub.layout(), &id.into())).unwrap()
    }
}

#[tokio::test]
async fn directive_flows_from_contracts_to_completion() {
    let d = directive_hub();
    d.seed_directive(
        DirectiveBuilder::new("dir-1", DirectivePhase::Negotiating)
            .requests(&["cp1", "r1", "r2"])
            .contract_proposals(&["cp1"])
            .build(),
    );
    d.settle("r1", "backend", RequestStatus::InProgress);
    d.settle("r2", "frontend", RequestStatus::Pending);

    // Contract proposal completes: directive starts implementing
    d.settle("cp1", "backend", RequestStatus::Completed);
    assert_eq!(d.phase("dir-1"), DirectivePhase::Implementing);

    // First implementation request done, one still open: no movement
    d.settle("r1", "backend", RequestStatus::Completed);
    assert_eq!(d.phase("dir-1"), DirectivePhase::Implementing);

    // All implementation done: a test request is spawned for qa
    d.settle("r2", "frontend", RequestStatus::Completed);
    assert_eq!(d.phase("dir-1"), DirectivePhase::Testing);

    let reloaded = d.reload("dir-1");
    assert_eq!(reloaded.header.test_requests.len(), 1);
    let test_id = reloaded.header.test_requests[0].clone();
    assert!(test_id.as_str().starts_with("req-test-"));
    assert!(reloaded.header.requests.contains(&test_id));

    let qa_requests = d.hub.inbox_of("qa");
    assert_eq!(qa_requests.len(), 1);
    assert_eq!(qa_requests[0].id(), &test_id);
    let mut deps: Vec<&str> = qa_requests[0]
        .header
        .depends_on_requests
        .iter()
        .map(|id| id.as_str())
        .collect();
    deps.sort();
    assert_eq!(deps, vec!["r1", "r2"]);

    // Test request passes: directive completes
    d.settle(test_id.as_str(), "qa", RequestStatus::Completed);
    assert_eq!(d.phase("dir-1"), DirectivePhase::Completed);

    assert!(d.hub.events().iter().any(|event| matches!(
        event,
        HubEvent::DirectiveTestResult { passed: true, .. }
    )));
    let changes: Vec<(DirectivePhase, DirectivePhase)> = d
        .hub
        .events()
        .into_iter()
        .filter_map(|event| match event {
            HubEvent::DirectivePhaseChange { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (DirectivePhase::Negotiating, DirectivePhase::Implementing),
            (DirectivePhase::Implementing, DirectivePhase::Testing),
            (DirectivePhase::Testing, DirectivePhase::Completed),
        ]
    );
}

#[tokio::test]
async fn failed_tests_spawn_fixes_and_reenter_implementation() {
    let d = directive_hub();
    d.seed_directive(
        DirectiveBuilder::new("dir-2", DirectivePhase::Testing)
            .requests(&["r1", "t1"])
            .test_requests(&["t1"])
            .build(),
    );
    d.settle("r1", "backend", RequestStatus::Completed);

    d.settle("t1", "qa", RequestStatus::Failed);
    assert_eq!(d.phase("dir-2"), DirectivePhase::Implementing);

    let fixes = d.hub.inbox_of("backend");
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].header.kind, "fix");
    assert!(d.reload("dir-2").header.requests.contains(fixes[0].id()));
    assert!(d.hub.events().iter().any(|event| matches!(
        event,
        HubEvent::DirectiveTestResult { passed: false, .. }
    )));
}

#[tokio::test]
async fn end_to_end_directive_through_the_worker_pool() {
    // The full loop: directive requests processed by workers, coordinator
    // reacting to bus events.
    let d = directive_hub();
    let task = {
        let coordinator = Arc::new(Coordinator::new(
            d.hub.layout().clone(),
            d.hub.ctx.config.clone(),
            d.hub.ctx.bus.clone(),
            d.hub.clock.clone(),
        ));
        coordinator.attach()
    };

    d.seed_directive(
        DirectiveBuilder::new("dir-3", DirectivePhase::Implementing)
            .requests(&["req-impl"])
            .build(),
    );
    d.hub.place(
        RequestBuilder::new("req-impl", "backend")
            .directive("dir-3")
            .build(),
    );

    // Worker completes the implementation request; the coordinator sees
    // request:completed and spawns the qa test request.
    assert_eq!(d.hub.tick().await, 1);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(d.phase("dir-3"), DirectivePhase::Testing);
    assert_eq!(d.hub.inbox_of("qa").len(), 1);

    // Next tick runs the test request (dependency satisfied, archive has
    // req-impl completed); the coordinator completes the directive.
    assert_eq!(d.hub.tick().await, 1);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(d.phase("dir-3"), DirectivePhase::Completed);

    task.abort();
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator: advances directives through their phase machine.
//!
//! Reacts to request completions. The dispatcher only mutates requests and
//! the coordinator only mutates directives, so the two run concurrently
//! without shared locks.
//!
//! Phase rules:
//! - planning: no automatic transitions (the planner hands off by setting
//!   the directive to negotiating once proposals exist).
//! - negotiating: proposals all completed -> implementing; any failed ->
//!   retry budget, then planning or failed; no proposals -> implementing.
//! - implementing: all done -> testing (or completed without a test
//!   service); failures with nothing left in flight -> failed.
//! - testing: latest test request decides; failure spawns fix requests.

use accord_core::{
    Clock, Directive, DirectiveId, DirectivePhase, EventBus, HubConfig, HubEvent, Request,
    RequestHeader, RequestId, RequestStatus,
};
use accord_store::{HubLayout, StoreError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Errors from directive coordination.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Asked to move a directive into a phase that does not exist. The
    /// operation is rejected; directive state is left untouched.
    #[error("unknown directive phase: {0}")]
    UnknownPhase(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How one group of request ids stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GroupProgress {
    any_failed: bool,
    any_open: bool,
    all_completed: bool,
}

fn group_progress(ids: &[RequestId], statuses: &HashMap<&str, RequestStatus>) -> GroupProgress {
    let mut any_failed = false;
    let mut any_open = false;
    let mut all_completed = !ids.is_empty();
    for id in ids {
        match statuses.get(id.as_str()) {
            Some(RequestStatus::Completed) => {}
            Some(RequestStatus::Failed) | Some(RequestStatus::Rejected) => {
                any_failed = true;
                all_completed = false;
            }
            // Missing means not observed yet; treat like open work
            _ => {
                any_open = true;
                all_completed = false;
            }
        }
    }
    GroupProgress {
        any_failed,
        any_open,
        all_completed,
    }
}

pub struct Coordinator<C: Clock> {
    layout: HubLayout,
    config: HubConfig,
    bus: EventBus,
    clock: C,
    /// Non-terminal directives seen by this coordinator.
    active: Mutex<HashMap<DirectiveId, DirectivePhase>>,
}

impl<C: Clock> Coordinator<C> {
    pub fn new(layout: HubLayout, config: HubConfig, bus: EventBus, clock: C) -> Self {
        Self {
            layout,
            config,
            bus,
            clock,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to request completion events and drive evaluation from a
    /// background task. Bus handlers stay non-blocking; the real work runs
    /// on the returned task.
    pub fn attach(self: &Arc<Self>) -> JoinHandle<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<RequestId>();
        self.bus.subscribe(move |event| match event {
            HubEvent::RequestCompleted { request_id, .. }
            | HubEvent::RequestFailed { request_id, .. } => {
                let _ = tx.send(request_id.clone());
            }
            _ => {}
        });

        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(request_id) = rx.recv().await {
                coordinator.on_request_settled(&request_id);
            }
        })
    }

    /// Directives this coordinator currently tracks as active.
    pub fn active_directives(&self) -> Vec<DirectiveId> {
        self.active.lock().keys().cloned().collect()
    }

    /// Find the directive owning `request_id` and evaluate it.
    pub fn on_request_settled(&self, request_id: &RequestId) {
        let directives = accord_store::scan_directives(&self.layout);
        let Some(mut directive) = directives.into_iter().find(|d| d.owns_request(request_id))
        else {
            return;
        };
        if let Err(e) = self.evaluate(&mut directive) {
            tracing::error!(
                directive_id = %directive.id(),
                error = %e,
                "directive evaluation failed"
            );
        }
    }

    /// Evaluate one directive against the current request set.
    pub fn evaluate(&self, directive: &mut Directive) -> Result<(), CoordinatorError> {
        let phase = directive.phase();
        if phase.is_terminal() {
            self.active.lock().remove(directive.id());
            return Ok(());
        }
        self.active.lock().insert(directive.id().clone(), phase);

        let requests = accord_store::scan_all(&self.layout);
        let statuses: HashMap<&str, RequestStatus> = requests
            .iter()
            .map(|request| (request.id().as_str(), request.status()))
            .collect();

        match phase {
            DirectivePhase::Planning => Ok(()),
            DirectivePhase::Negotiating => self.evaluate_negotiating(directive, &statuses),
            DirectivePhase::Implementing => self.evaluate_implementing(directive, &statuses),
            DirectivePhase::Testing => self.evaluate_testing(directive, &requests, &statuses),
            DirectivePhase::Completed | DirectivePhase::Failed => Ok(()),
        }
    }

    /// Operator override: force a directive into a named phase.
    ///
    /// An unknown phase name is rejected without touching the directive.
    pub fn apply_phase_override(
        &self,
        directive_id: &DirectiveId,
        phase: &str,
    ) -> Result<(), CoordinatorError> {
        let target = DirectivePhase::parse(phase)
            .ok_or_else(|| CoordinatorError::UnknownPhase(phase.to_string()))?;
        let path = accord_store::directive_path(&self.layout, directive_id);
        let mut directive = accord_store::parse_directive(&path)?;
        self.transition(&mut directive, target, "operator override")
    }

    fn evaluate_negotiating(
        &self,
        directive: &mut Directive,
        statuses: &HashMap<&str, RequestStatus>,
    ) -> Result<(), CoordinatorError> {
        if directive.header.contract_proposals.is_empty() {
            return self.transition(directive, DirectivePhase::Implementing, "no contracts needed");
        }
        let progress = group_progress(&directive.header.contract_proposals, statuses);
        if progress.any_failed {
            directive.header.retry_count += 1;
            if directive.header.retry_count >= directive.header.max_retries {
                return self.transition(
                    directive,
                    DirectivePhase::Failed,
                    "contract negotiation exhausted",
                );
            }
            let message = format!(
                "contract rejected, replanning (attempt {}/{})",
                directive.header.retry_count, directive.header.max_retries
            );
            return self.transition(directive, DirectivePhase::Planning, &message);
        }
        if progress.all_completed {
            return self.transition(directive, DirectivePhase::Implementing, "contracts agreed");
        }
        Ok(())
    }

    fn evaluate_implementing(
        &self,
        directive: &mut Directive,
        statuses: &HashMap<&str, RequestStatus>,
    ) -> Result<(), CoordinatorError> {
        let implementation: Vec<RequestId> = directive
            .implementation_requests()
            .into_iter()
            .cloned()
            .collect();
        let progress = group_progress(&implementation, statuses);

        if progress.any_failed && !progress.any_open {
            return self.transition(directive, DirectivePhase::Failed, "implementation failed");
        }
        if progress.all_completed {
            if let Some(test_service) = self.config.coordination.test_agent_service.clone() {
                let test_id = self.create_test_request(directive, &test_service, &implementation)?;
                directive.header.test_requests.push(test_id.clone());
                directive.header.requests.push(test_id);
                return self.transition(
                    directive,
                    DirectivePhase::Testing,
                    "implementation complete, testing",
                );
            }
            return self.transition(
                directive,
                DirectivePhase::Completed,
                "implementation complete",
            );
        }
        Ok(())
    }

    fn evaluate_testing(
        &self,
        directive: &mut Directive,
        requests: &[Request],
        statuses: &HashMap<&str, RequestStatus>,
    ) -> Result<(), CoordinatorError> {
        // Only the most recent test request counts
        let Some(test_id) = directive.header.test_requests.last().cloned() else {
            return Ok(());
        };
        match statuses.get(test_id.as_str()) {
            Some(RequestStatus::Completed) => {
                self.bus.emit(&HubEvent::DirectiveTestResult {
                    directive_id: directive.id().clone(),
                    test_request_id: test_id,
                    passed: true,
                });
                self.transition(directive, DirectivePhase::Completed, "tests passed")
            }
            Some(RequestStatus::Failed) | Some(RequestStatus::Rejected) => {
                self.bus.emit(&HubEvent::DirectiveTestResult {
                    directive_id: directive.id().clone(),
                    test_request_id: test_id.clone(),
                    passed: false,
                });
                let services = self.affected_services(directive, requests);
                let contracts = self.affected_contracts(directive, requests);
                for service in &services {
                    let fix_id =
                        self.create_fix_request(directive, service, &test_id, &contracts)?;
                    directive.header.requests.push(fix_id);
                }
                self.transition(directive, DirectivePhase::Implementing, "tests failed, fixing")
            }
            _ => Ok(()),
        }
    }

    /// Services that implemented this directive, from the observed
    /// requests whose ids sit in its implementation list.
    fn affected_services(&self, directive: &Directive, requests: &[Request]) -> BTreeSet<String> {
        let implementation: BTreeSet<&str> = directive
            .implementation_requests()
            .into_iter()
            .map(|id| id.as_str())
            .collect();
        requests
            .iter()
            .filter(|request| implementation.contains(request.id().as_str()))
            .map(|request| request.service.clone())
            .collect()
    }

    /// Contracts referenced by this directive's requests, deduplicated.
    fn affected_contracts(&self, directive: &Directive, requests: &[Request]) -> BTreeSet<String> {
        requests
            .iter()
            .filter(|request| directive.header.requests.contains(request.id()))
            .filter_map(|request| request.header.related_contract.clone())
            .collect()
    }

    fn now_ts(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.clock.epoch_ms() as i64)
            .unwrap_or_else(Utc::now)
    }

    fn create_test_request(
        &self,
        directive: &Directive,
        service: &str,
        dependencies: &[RequestId],
    ) -> Result<RequestId, CoordinatorError> {
        let id = RequestId::new(format!("req-test-{}", self.clock.epoch_ms()));
        let mut header = RequestHeader::new(id.as_str(), service);
        header.from = "coordinator".to_string();
        header.kind = "test".to_string();
        header.priority = directive.header.priority;
        header.directive = Some(directive.id().clone());
        header.created = Some(self.now_ts());
        header.updated = Some(self.now_ts());
        header.depends_on_requests = dependencies.to_vec();

        let list = dependencies
            .iter()
            .map(|dep| format!("- {dep}"))
            .collect::<Vec<_>>()
            .join("\n");
        let body = format!(
            "Validate directive `{}` ({}).\n\nRun the test suite covering the changes from:\n\n{list}\n",
            directive.id(),
            directive.header.title,
        );

        let path = self
            .layout
            .service_inbox(service)
            .join(format!("{id}.md"));
        accord_store::write_request(&path, &header, &body)?;
        tracing::info!(directive_id = %directive.id(), test_request = %id, "created test request");
        Ok(id)
    }

    fn create_fix_request(
        &self,
        directive: &Directive,
        service: &str,
        test_id: &RequestId,
        contracts: &BTreeSet<String>,
    ) -> Result<RequestId, CoordinatorError> {
        let id = RequestId::new(format!("req-fix-{service}-{}", self.clock.epoch_ms()));
        let mut header = RequestHeader::new(id.as_str(), service);
        header.from = "coordinator".to_string();
        header.kind = "fix".to_string();
        header.priority = directive.header.priority;
        header.directive = Some(directive.id().clone());
        header.created = Some(self.now_ts());
        header.updated = Some(self.now_ts());

        let mut body = format!(
            "Tests for directive `{}` failed (test request `{test_id}`).\n\nInvestigate the failures affecting `{service}` and fix them.\n",
            directive.id(),
        );
        if !contracts.is_empty() {
            body.push_str("\nContracts in play:\n");
            for contract in contracts {
                body.push_str(&format!("- {contract}\n"));
            }
        }

        let path = self
            .layout
            .service_inbox(service)
            .join(format!("{id}.md"));
        accord_store::write_request(&path, &header, &body)?;
        tracing::info!(directive_id = %directive.id(), fix_request = %id, service, "created fix request");
        Ok(id)
    }

    fn transition(
        &self,
        directive: &mut Directive,
        to: DirectivePhase,
        message: &str,
    ) -> Result<(), CoordinatorError> {
        let from = directive.phase();
        directive.header.status = to;
        accord_store::write_directive(directive)?;

        tracing::info!(
            directive_id = %directive.id(),
            %from,
            %to,
            message,
            "directive phase change"
        );
        self.bus.emit(&HubEvent::DirectivePhaseChange {
            directive_id: directive.id().clone(),
            from,
            to,
            message: message.to_string(),
        });

        let mut active = self.active.lock();
        if to.is_terminal() {
            active.remove(directive.id());
        } else {
            active.insert(directive.id().clone(), to);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

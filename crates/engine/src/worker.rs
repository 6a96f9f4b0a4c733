// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker: processes one claimed request at a time.
//!
//! A worker owns the request file between claim and archive. It never
//! propagates errors to the dispatcher; every path funnels into a
//! [`RequestResult`] and the slot always returns to idle.

use crate::commands;
use crate::context::HubContext;
use crate::prompt;
use accord_adapters::{AgentBackend, AgentError, AgentInvocation, AgentOutcome, SyncTransport};
use accord_core::{
    Clock, HistoryEntry, HubEvent, Priority, Request, RequestHeader, RequestId, RequestStatus,
    RotationReason, Scope,
};
use accord_store::layout::ORCHESTRATOR_SERVICE;
use accord_store::StoreError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Turn budget passed to agent invocations.
const MAX_TURNS: u32 = 50;

/// What the dispatcher gets back for every processed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestResult {
    pub request_id: RequestId,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy,
}

/// Transient per-worker state, snapshotted by the dispatcher.
#[derive(Debug, Clone)]
pub struct WorkerSlot {
    pub state: WorkerState,
    pub current_request: Option<RequestId>,
    pub current_service: Option<String>,
    pub started_at_ms: Option<u64>,
    /// Last service this worker processed, for session affinity.
    pub last_service: Option<String>,
}

impl Default for WorkerSlot {
    fn default() -> Self {
        Self {
            state: WorkerState::Idle,
            current_request: None,
            current_service: None,
            started_at_ms: None,
            last_service: None,
        }
    }
}

pub struct Worker<A, T, C: Clock> {
    id: usize,
    slot: Arc<Mutex<WorkerSlot>>,
    ctx: Arc<HubContext<A, T, C>>,
}

impl<A, T, C: Clock> Clone for Worker<A, T, C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            slot: Arc::clone(&self.slot),
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<A, T, C> Worker<A, T, C>
where
    A: AgentBackend,
    T: SyncTransport,
    C: Clock,
{
    pub fn new(id: usize, ctx: Arc<HubContext<A, T, C>>) -> Self {
        Self {
            id,
            slot: Arc::new(Mutex::new(WorkerSlot::default())),
            ctx,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn slot(&self) -> WorkerSlot {
        self.slot.lock().clone()
    }

    pub fn is_idle(&self) -> bool {
        self.slot.lock().state == WorkerState::Idle
    }

    pub fn last_service(&self) -> Option<String> {
        self.slot.lock().last_service.clone()
    }

    /// Process one request end to end.
    pub async fn process_request(&self, request: Request) -> RequestResult {
        let service = request.service.clone();
        let request_id = request.id().clone();

        {
            let mut slot = self.slot.lock();
            slot.state = WorkerState::Busy;
            slot.current_request = Some(request_id.clone());
            slot.current_service = Some(service.clone());
            slot.started_at_ms = Some(self.ctx.clock.epoch_ms());
        }
        self.ctx.bus.emit(&HubEvent::WorkerStarted {
            worker_id: self.id,
            request_id: request_id.clone(),
            service: service.clone(),
        });

        let started = Instant::now();
        let outcome = if request.is_command() {
            self.run_command_path(&request).await
        } else {
            self.run_agent_path(&request).await
        };

        let result = outcome.unwrap_or_else(|e| {
            tracing::error!(request_id = %request_id, error = %e, "request processing aborted");
            RequestResult {
                request_id: request_id.clone(),
                success: false,
                duration_ms: started.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
            }
        });

        {
            let mut slot = self.slot.lock();
            slot.state = WorkerState::Idle;
            slot.current_request = None;
            slot.current_service = None;
            slot.started_at_ms = None;
            slot.last_service = Some(service);
        }
        result
    }

    async fn commit(&self, message: &str) {
        let _gate = self.ctx.sync_gate.lock().await;
        match self.ctx.sync.commit(self.ctx.layout.root(), message).await {
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "commit failed"),
        }
    }

    fn append_history(&self, entry: HistoryEntry) {
        if let Err(e) = self.ctx.history.append(&entry) {
            tracing::warn!(request_id = %entry.request_id, error = %e, "could not write history");
        }
    }

    /// Diagnostics fast-path: no claim, no agent, straight to archive.
    async fn run_command_path(&self, request: &Request) -> Result<RequestResult, StoreError> {
        let ctx = &self.ctx;
        let request_id = request.id().clone();
        let service = request.service.clone();
        let started = Instant::now();

        let output = commands::run_command(request, &ctx.layout, &ctx.config);
        accord_store::append_result(&request.path, &output.report)?;
        accord_store::set_status(&request.path, RequestStatus::Completed)?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let mut entry = HistoryEntry::transition(
            ctx.now_ts(),
            request_id.clone(),
            request.status(),
            RequestStatus::Completed,
            &service,
        );
        entry.directive_id = request.header.directive.clone();
        entry.detail = Some(format!(
            "command: {}",
            request.header.command.as_deref().unwrap_or("<missing>")
        ));
        entry.duration_ms = Some(duration_ms);
        self.append_history(entry);

        accord_store::archive(&request.path, &ctx.layout)?;
        self.commit(&format!("complete request {request_id}")).await;
        ctx.bus.emit(&HubEvent::RequestCompleted {
            request_id: request_id.clone(),
            service,
            directive: request.header.directive.clone(),
            duration_ms,
        });

        let error = (!output.success).then(|| output.report.lines().next().unwrap_or("").to_string());
        Ok(RequestResult {
            request_id,
            success: output.success,
            duration_ms,
            error,
        })
    }

    /// Agent path: claim, invoke, then commit the success or failure.
    async fn run_agent_path(&self, request: &Request) -> Result<RequestResult, StoreError> {
        let ctx = &self.ctx;
        let request_id = request.id().clone();
        let service = request.service.clone();
        let cwd = ctx.service_dir(&service);

        // Rotate a stale session before invoking
        if let Some(reason) = ctx.sessions.should_rotate(&service) {
            if let Some(old) = ctx.sessions.rotate(&service) {
                ctx.bus.emit(&HubEvent::SessionRotated {
                    service: service.clone(),
                    session_id: old.session_id,
                    reason,
                });
            }
            ctx.sessions.save();
        }

        // Claim
        accord_store::set_status(&request.path, RequestStatus::InProgress)?;
        let attempt = accord_store::increment_attempts(&request.path)?;
        self.commit(&format!("claim request {request_id}")).await;
        ctx.bus.emit(&HubEvent::RequestClaimed {
            request_id: request_id.clone(),
            service: service.clone(),
            attempt,
        });
        let mut entry = HistoryEntry::transition(
            ctx.now_ts(),
            request_id.clone(),
            request.status(),
            RequestStatus::InProgress,
            &service,
        );
        entry.directive_id = request.header.directive.clone();
        self.append_history(entry);

        // Build prompt with any prior-failure checkpoint
        let checkpoint = ctx.sessions.read_checkpoint(&request_id);
        let prompt = prompt::build_prompt(request, &ctx.layout, checkpoint.as_deref());

        let resume_session_id = ctx
            .backend
            .supports_resume()
            .then(|| ctx.sessions.get(&service).map(|s| s.session_id))
            .flatten();
        let invocation = AgentInvocation {
            prompt,
            cwd,
            resume_session_id,
            timeout: ctx.config.dispatch.request_timeout(),
            model: ctx.config.dispatch.model.clone(),
            max_turns: Some(MAX_TURNS),
            max_budget_usd: ctx.config.dispatch.max_budget_usd,
        };

        // Forward stream events onto the bus as worker:output
        let (events_tx, mut events_rx) = mpsc::channel(64);
        let forwarder = {
            let bus = ctx.bus.clone();
            let worker_id = self.id;
            let request_id = request_id.clone();
            tokio::spawn(async move {
                while let Some(event) = events_rx.recv().await {
                    bus.emit(&HubEvent::WorkerOutput {
                        worker_id,
                        request_id: request_id.clone(),
                        event,
                    });
                }
            })
        };

        let started = Instant::now();
        let outcome = ctx.backend.invoke(invocation, events_tx).await;
        // Drain remaining stream output before emitting completion events
        let _ = forwarder.await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(outcome) => self.finish_success(request, outcome).await,
            Err(error) => self.finish_failure(request, attempt, duration_ms, error).await,
        }
    }

    async fn finish_success(
        &self,
        request: &Request,
        outcome: AgentOutcome,
    ) -> Result<RequestResult, StoreError> {
        let ctx = &self.ctx;
        let request_id = request.id().clone();
        let service = request.service.clone();

        if let Some(session_id) = &outcome.session_id {
            let created = ctx.sessions.record_use(&service, session_id);
            if created {
                ctx.bus.emit(&HubEvent::SessionCreated {
                    service: service.clone(),
                    session_id: session_id.clone(),
                });
            }
        }
        ctx.sessions.clear_checkpoint(&request_id);
        ctx.sessions.save();

        accord_store::set_status(&request.path, RequestStatus::Completed)?;
        accord_store::archive(&request.path, &ctx.layout)?;

        let mut entry = HistoryEntry::transition(
            ctx.now_ts(),
            request_id.clone(),
            RequestStatus::InProgress,
            RequestStatus::Completed,
            &service,
        );
        entry.directive_id = request.header.directive.clone();
        entry.duration_ms = Some(outcome.duration_ms);
        entry.cost_usd = outcome.cost_usd;
        entry.num_turns = outcome.num_turns;
        entry.usage = outcome.usage;
        entry.model_usage = outcome.model_usage.clone();
        self.append_history(entry);

        self.commit(&format!("complete request {request_id}")).await;
        ctx.bus.emit(&HubEvent::RequestCompleted {
            request_id: request_id.clone(),
            service,
            directive: request.header.directive.clone(),
            duration_ms: outcome.duration_ms,
        });

        Ok(RequestResult {
            request_id,
            success: true,
            duration_ms: outcome.duration_ms,
            error: None,
        })
    }

    async fn finish_failure(
        &self,
        request: &Request,
        attempt: u32,
        duration_ms: u64,
        error: AgentError,
    ) -> Result<RequestResult, StoreError> {
        let ctx = &self.ctx;
        let request_id = request.id().clone();
        let service = request.service.clone();
        let error_text = error.to_string();

        // The session is suspect after a failure; rotate it out
        if let Some(old) = ctx.sessions.rotate(&service) {
            ctx.bus.emit(&HubEvent::SessionRotated {
                service: service.clone(),
                session_id: old.session_id,
                reason: RotationReason::Error,
            });
            ctx.sessions.save();
        }

        ctx.sessions.write_checkpoint(
            &request_id,
            &format!("Attempt {attempt} failed: {error_text}\n"),
        );

        let will_retry = attempt < ctx.config.dispatch.max_attempts;
        if will_retry {
            accord_store::set_status(&request.path, RequestStatus::Pending)?;
            let mut entry = HistoryEntry::transition(
                ctx.now_ts(),
                request_id.clone(),
                RequestStatus::InProgress,
                RequestStatus::Pending,
                &service,
            );
            entry.directive_id = request.header.directive.clone();
            entry.detail = Some(format!("attempt {attempt} failed, will retry: {error_text}"));
            entry.duration_ms = Some(duration_ms);
            self.append_history(entry);
            self.commit(&format!("retry request {request_id}")).await;
        } else {
            accord_store::set_status(&request.path, RequestStatus::Failed)?;
            accord_store::archive(&request.path, &ctx.layout)?;
            self.write_escalation(request, attempt, &error_text)?;
            // Terminal: the checkpoint has served its purpose
            ctx.sessions.clear_checkpoint(&request_id);

            let mut entry = HistoryEntry::transition(
                ctx.now_ts(),
                request_id.clone(),
                RequestStatus::InProgress,
                RequestStatus::Failed,
                &service,
            );
            entry.directive_id = request.header.directive.clone();
            entry.detail = Some(format!("failed after {attempt} attempt(s): {error_text}"));
            entry.duration_ms = Some(duration_ms);
            self.append_history(entry);
            self.commit(&format!("fail request {request_id}")).await;
        }

        ctx.bus.emit(&HubEvent::RequestFailed {
            request_id: request_id.clone(),
            service,
            directive: request.header.directive.clone(),
            error: error_text.clone(),
            will_retry,
        });

        Ok(RequestResult {
            request_id,
            success: false,
            duration_ms,
            error: Some(error_text),
        })
    }

    /// Create the escalation request in the orchestrator inbox.
    fn write_escalation(
        &self,
        request: &Request,
        attempts: u32,
        error_text: &str,
    ) -> Result<(), StoreError> {
        let ctx = &self.ctx;
        let service = &request.service;
        let id = format!("req-escalation-{service}-{}", ctx.clock.epoch_ms());

        let mut header = RequestHeader::new(id.clone(), ORCHESTRATOR_SERVICE);
        header.from = service.clone();
        header.kind = "escalation".to_string();
        header.priority = Priority::High;
        header.scope = Scope::Internal;
        header.created = Some(ctx.now_ts());
        header.updated = Some(ctx.now_ts());
        header.originated_from = Some(request.id().to_string());
        header.related_contract = request.header.related_contract.clone();
        header.directive = request.header.directive.clone();

        let body = format!(
            "## Escalation\n\nRequest `{original}` to `{service}` failed after {attempts} attempt(s).\n\nLast error:\n\n```\n{error_text}\n```\n\n## Original request\n\n{original_body}",
            original = request.id(),
            original_body = request.body.trim_end(),
        );

        let path = ctx
            .layout
            .orchestrator_inbox()
            .join(format!("{id}.md"));
        accord_store::write_request(&path, &header, &body)?;
        tracing::info!(request_id = %request.id(), escalation = %id, "escalated to orchestrator");
        Ok(())
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

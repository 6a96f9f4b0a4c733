// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher: assigns pending requests to the worker pool.
//!
//! Invariants enforced here:
//! - at most one in-flight request per service name
//! - at most one in-flight request per working directory
//! - at most `workers` in-flight requests total

use crate::context::HubContext;
use crate::worker::{Worker, WorkerState};
use accord_adapters::{AgentBackend, SyncTransport};
use accord_core::{Clock, HubEvent, Request};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

pub struct Dispatcher<A, T, C: Clock> {
    ctx: Arc<HubContext<A, T, C>>,
    workers: Vec<Worker<A, T, C>>,
}

impl<A, T, C> Dispatcher<A, T, C>
where
    A: AgentBackend,
    T: SyncTransport,
    C: Clock,
{
    pub fn new(ctx: Arc<HubContext<A, T, C>>) -> Self {
        let count = ctx.config.dispatch.workers.max(1);
        let workers = (0..count)
            .map(|id| Worker::new(id, Arc::clone(&ctx)))
            .collect();
        Self { ctx, workers }
    }

    pub fn ctx(&self) -> &Arc<HubContext<A, T, C>> {
        &self.ctx
    }

    pub fn workers(&self) -> &[Worker<A, T, C>] {
        &self.workers
    }

    /// Idle worker for `service`: session affinity first (the worker that
    /// last served this service), then lowest id.
    fn pick_idle_worker(&self, reserved: &HashSet<usize>, service: &str) -> Option<usize> {
        let mut fallback = None;
        for worker in &self.workers {
            if reserved.contains(&worker.id()) || !worker.is_idle() {
                continue;
            }
            if worker.last_service().as_deref() == Some(service) {
                return Some(worker.id());
            }
            if fallback.is_none() {
                fallback = Some(worker.id());
            }
        }
        fallback
    }

    /// Plan assignments for a priority-sorted pending list.
    fn plan(&self, pending: Vec<Request>) -> Vec<(usize, Request)> {
        let mut active_services: HashSet<String> = HashSet::new();
        let mut active_dirs: HashSet<PathBuf> = HashSet::new();
        for worker in &self.workers {
            let slot = worker.slot();
            if slot.state == WorkerState::Busy {
                if let Some(service) = slot.current_service {
                    active_dirs.insert(self.ctx.service_dir(&service));
                    active_services.insert(service);
                }
            }
        }

        let mut reserved: HashSet<usize> = HashSet::new();
        let mut assignments = Vec::new();
        for request in pending {
            let service = request.service.clone();
            if active_services.contains(&service) {
                continue;
            }
            let dir = self.ctx.service_dir(&service);
            if active_dirs.contains(&dir) {
                continue;
            }
            let Some(worker_id) = self.pick_idle_worker(&reserved, &service) else {
                continue;
            };
            active_services.insert(service);
            active_dirs.insert(dir);
            reserved.insert(worker_id);
            assignments.push((worker_id, request));
        }
        assignments
    }

    /// Assign and run a batch of pending requests.
    ///
    /// Returns the number of assignments performed; in dry-run, the number
    /// that would have been performed.
    pub async fn dispatch(&self, pending: Vec<Request>, dry_run: bool) -> usize {
        let assignments = self.plan(pending);
        let count = assignments.len();
        if dry_run || count == 0 {
            return count;
        }

        let mut batch = JoinSet::new();
        for (worker_id, request) in assignments {
            let worker = self.workers[worker_id].clone();
            batch.spawn(async move { worker.process_request(request).await });
        }
        while let Some(joined) = batch.join_next().await {
            match joined {
                Ok(result) => tracing::info!(
                    request_id = %result.request_id,
                    success = result.success,
                    duration_ms = result.duration_ms,
                    "request processed"
                ),
                Err(e) => tracing::error!(error = %e, "worker task failed"),
            }
        }

        // One commit and push for the whole batch
        let root = self.ctx.layout.root().to_path_buf();
        let message = format!("dispatcher processed {count} request(s)");
        {
            let _gate = self.ctx.sync_gate.lock().await;
            if let Err(e) = self.ctx.sync.commit(&root, &message).await {
                tracing::warn!(error = %e, "batch commit failed");
            }
            if let Err(e) = self.ctx.sync.push(&root).await {
                tracing::warn!(error = %e, "push failed");
            }
        }
        self.ctx.bus.emit(&HubEvent::SyncPush { dir: root });

        count
    }

    /// Stop accepting work and release backend resources.
    ///
    /// In-flight workers are awaited by the caller finishing its dispatch
    /// call; by the time this runs the pool is quiet.
    pub async fn shutdown(&self) {
        self.ctx.backend.close_all().await;
        self.ctx.sessions.save();
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, shutdown.

use accord_adapters::{AgentError, AgentRouter, GitSync};
use accord_core::{ConfigError, EventBus, HubEvent, SystemClock};
use accord_engine::{Coordinator, Dispatcher, HubContext, Scheduler};
use accord_store::HubLayout;
use crate::services::attach_service_watcher;
use fs2::FileExt;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

/// Concrete engine types the daemon runs with.
pub type DaemonContext = HubContext<AgentRouter, GitSync, SystemClock>;
pub type DaemonDispatcher = Dispatcher<AgentRouter, GitSync, SystemClock>;
pub type DaemonScheduler = Scheduler<AgentRouter, GitSync, SystemClock>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("agent backend setup failed: {0}")]
    Agent(#[from] AgentError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("another accordd already runs for {0}")]
    AlreadyRunning(PathBuf),
}

/// A started daemon: engine wired up, scheduler and coordinator running.
pub struct Daemon {
    pub ctx: Arc<DaemonContext>,
    pub dispatcher: Arc<DaemonDispatcher>,
    pub scheduler: Arc<DaemonScheduler>,
    pub coordinator: Arc<Coordinator<SystemClock>>,
    scheduler_task: JoinHandle<()>,
    coordinator_task: JoinHandle<()>,
    // NOTE(lifetime): held to maintain the exclusive lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

/// Path of the daemon lock file under a hub root.
pub fn lock_path(hub_root: &Path) -> PathBuf {
    hub_root.join("accordd.lock")
}

fn acquire_lock(hub_root: &Path) -> Result<File, LifecycleError> {
    let path = lock_path(hub_root);
    let mut file = File::create(&path)?;
    if file.try_lock_exclusive().is_err() {
        return Err(LifecycleError::AlreadyRunning(hub_root.to_path_buf()));
    }
    let _ = writeln!(file, "{}", std::process::id());
    Ok(file)
}

impl Daemon {
    /// Load config, take the lock, and start the engine for `hub_root`.
    pub fn start(hub_root: PathBuf) -> Result<Self, LifecycleError> {
        let layout = HubLayout::new(hub_root);
        let config = accord_store::load_hub_config(&layout.config_path())?;
        layout.ensure_dirs()?;
        let lock_file = acquire_lock(layout.root())?;

        let bus = EventBus::new();
        let backend = AgentRouter::from_config(&config.dispatch)?;
        let ctx = Arc::new(HubContext::new(
            layout.clone(),
            config.clone(),
            bus.clone(),
            SystemClock,
            backend,
            GitSync::new(),
        ));

        // Announce the configured services and make sure their inboxes exist
        let mut known_services = BTreeSet::new();
        known_services.insert(accord_store::layout::ORCHESTRATOR_SERVICE.to_string());
        for service in config.service_names() {
            std::fs::create_dir_all(layout.service_inbox(service))?;
            bus.emit(&HubEvent::ServiceAdded {
                service: service.to_string(),
            });
            known_services.insert(service.to_string());
        }
        // Watch for inboxes appearing or disappearing after startup
        attach_service_watcher(&bus, layout.clone(), known_services);

        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&ctx)));
        let scheduler = Arc::new(Scheduler::new(Arc::clone(&dispatcher)));
        let coordinator = Arc::new(Coordinator::new(
            layout,
            config,
            bus,
            SystemClock,
        ));

        let coordinator_task = coordinator.attach();
        let scheduler_task = scheduler.start();
        info!(hub = %ctx.layout.root().display(), "accordd started");

        Ok(Self {
            ctx,
            dispatcher,
            scheduler,
            coordinator,
            scheduler_task,
            coordinator_task,
            lock_file,
        })
    }

    pub fn bus(&self) -> &EventBus {
        &self.ctx.bus
    }

    /// Orderly shutdown: stop ticking, await in-flight work, close
    /// sessions, save state.
    pub async fn shutdown(self) {
        info!("shutting down");
        self.scheduler.stop();
        let _ = self.scheduler_task.await;
        self.dispatcher.shutdown().await;
        self.coordinator_task.abort();
        info!("accordd stopped");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

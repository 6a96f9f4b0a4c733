// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scenario harness.

use accord_adapters::{FakeAgentBackend, FakeSync};
use accord_core::test_support::RequestBuilder;
use accord_core::{
    EventBus, FakeClock, HubConfig, HubEvent, ProjectConfig, RepoModel, Request, ServiceConfig,
};
use accord_engine::{Dispatcher, HubContext, Scheduler};
use accord_store::{parse_request, scan_archive, scan_inboxes, write_request, HubLayout};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub type SpecContext = HubContext<FakeAgentBackend, FakeSync, FakeClock>;

pub struct SpecHub {
    // Keeps the hub directory alive for the scenario's duration
    #[allow(dead_code)]
    tmp: TempDir,
    pub ctx: Arc<SpecContext>,
    pub scheduler: Arc<Scheduler<FakeAgentBackend, FakeSync, FakeClock>>,
    pub backend: FakeAgentBackend,
    pub sync: FakeSync,
    pub clock: FakeClock,
    events: Arc<Mutex<Vec<HubEvent>>>,
}

pub fn base_config() -> HubConfig {
    HubConfig {
        project: ProjectConfig {
            name: "demo".to_string(),
        },
        services: vec![
            ServiceConfig::named("backend"),
            ServiceConfig::named("frontend"),
            ServiceConfig::named("qa"),
        ],
        ..HubConfig::default()
    }
}

pub fn hub(configure: impl FnOnce(&mut HubConfig)) -> SpecHub {
    hub_with_backend(FakeAgentBackend::new(), configure)
}

pub fn hub_with_backend(
    backend: FakeAgentBackend,
    configure: impl FnOnce(&mut HubConfig),
) -> SpecHub {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = base_config();
    configure(&mut config);

    // Multi-repo scenarios get a directory per service under the hub
    if config.repo_model == RepoModel::MultiRepo {
        for service in &mut config.services {
            if service.dir.is_none() {
                let dir = tmp.path().join("repos").join(&service.name);
                std::fs::create_dir_all(&dir).unwrap();
                service.dir = Some(dir);
            }
        }
    }

    let layout = HubLayout::new(tmp.path());
    layout.ensure_dirs().unwrap();

    let bus = EventBus::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    {
        let events = Arc::clone(&events);
        bus.subscribe(move |event| {
            if let Ok(mut seen) = events.lock() {
                seen.push(event.clone());
            }
        });
    }

    let clock = FakeClock::new();
    let sync = FakeSync::new();
    let ctx = Arc::new(HubContext::new(
        layout,
        config,
        bus,
        clock.clone(),
        backend.clone(),
        sync.clone(),
    ));
    let scheduler = Arc::new(Scheduler::new(Arc::new(Dispatcher::new(Arc::clone(&ctx)))));

    SpecHub {
        tmp,
        ctx,
        scheduler,
        backend,
        sync,
        clock,
        events,
    }
}

impl SpecHub {
    pub fn layout(&self) -> &HubLayout {
        &self.ctx.layout
    }

    pub async fn tick(&self) -> usize {
        self.scheduler.trigger_now().await
    }

    /// Write a request into its service inbox.
    pub fn place(&self, request: Request) -> Request {
        let path = self
            .layout()
            .service_inbox(&request.service)
            .join(format!("{}.md", request.id()));
        write_request(&path, &request.header, &request.body).unwrap();
        parse_request(&path).unwrap()
    }

    pub fn inbox(&self) -> Vec<Request> {
        scan_inboxes(self.layout())
    }

    pub fn inbox_of(&self, service: &str) -> Vec<Request> {
        self.inbox()
            .into_iter()
            .filter(|request| request.service == service)
            .collect()
    }

    pub fn archive(&self) -> Vec<Request> {
        scan_archive(self.layout())
    }

    pub fn events(&self) -> Vec<HubEvent> {
        self.events.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

pub fn pending(id: &str, service: &str) -> Request {
    RequestBuilder::new(id, service).build()
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.
#![allow(clippy::unwrap_used)]
#![allow(dead_code)]

use crate::context::HubContext;
use accord_adapters::{FakeAgentBackend, FakeSync};
use accord_core::test_support::RequestBuilder;
use accord_core::{
    EventBus, FakeClock, HubConfig, HubEvent, ProjectConfig, RepoModel, Request, ServiceConfig,
};
use accord_store::{parse_request, write_request, HubLayout};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) type TestContext = HubContext<FakeAgentBackend, FakeSync, FakeClock>;

pub(crate) struct Fixture {
    pub tmp: TempDir,
    pub ctx: Arc<TestContext>,
    pub backend: FakeAgentBackend,
    pub sync: FakeSync,
    pub clock: FakeClock,
    events: Arc<Mutex<Vec<HubEvent>>>,
}

impl Fixture {
    pub fn layout(&self) -> &HubLayout {
        &self.ctx.layout
    }

    pub fn events(&self) -> Vec<HubEvent> {
        self.events.lock().clone()
    }

    pub fn topics(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|event| event.topic()).collect()
    }
}

pub(crate) fn test_config() -> HubConfig {
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

/// Multi-repo config with per-service directories under the hub root.
pub(crate) fn multi_repo_config(hub_root: &Path) -> HubConfig {
    let mut config = test_config();
    config.repo_model = RepoModel::MultiRepo;
    for service in &mut config.services {
        let dir = hub_root.join("repos").join(&service.name);
        std::fs::create_dir_all(&dir).unwrap();
        service.dir = Some(dir);
    }
    config
}

pub(crate) fn fixture() -> Fixture {
    fixture_with(test_config(), FakeAgentBackend::new())
}

pub(crate) fn fixture_with(config: HubConfig, backend: FakeAgentBackend) -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let layout = HubLayout::new(tmp.path());
    layout.ensure_dirs().unwrap();

    let bus = EventBus::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    {
        let events = Arc::clone(&events);
        bus.subscribe(move |event| events.lock().push(event.clone()));
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
    Fixture {
        tmp,
        ctx,
        backend,
        sync,
        clock,
        events,
    }
}

/// Write a request into its inbox and re-parse so `path` is real.
pub(crate) fn place(fixture: &Fixture, request: Request) -> Request {
    let path = fixture
        .ctx
        .layout
        .service_inbox(&request.service)
        .join(format!("{}.md", request.id()));
    write_request(&path, &request.header, &request.body).unwrap();
    parse_request(&path).unwrap()
}

pub(crate) fn pending(id: &str, service: &str) -> Request {
    RequestBuilder::new(id, service).build()
}

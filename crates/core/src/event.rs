// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hub lifecycle events and adapter stream events.

use crate::directive::DirectivePhase;
use crate::id::{DirectiveId, RequestId};
use crate::session::RotationReason;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One block of streamed agent output, delivered during an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        output: String,
        is_error: bool,
    },
    Thinking {
        text: String,
    },
    Status {
        status: String,
    },
}

/// Events published on the hub bus.
///
/// Serializes with `{"type": "topic:name", ...fields}` format, matching the
/// frames external consumers see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HubEvent {
    // -- scheduler --
    #[serde(rename = "scheduler:tick")]
    SchedulerTick {
        pending_count: usize,
        processed_count: usize,
        timestamp: u64,
    },

    // -- sync --
    #[serde(rename = "sync:pull")]
    SyncPull { dir: PathBuf },

    #[serde(rename = "sync:push")]
    SyncPush { dir: PathBuf },

    // -- request lifecycle --
    #[serde(rename = "request:claimed")]
    RequestClaimed {
        request_id: RequestId,
        service: String,
        attempt: u32,
    },

    #[serde(rename = "request:completed")]
    RequestCompleted {
        request_id: RequestId,
        service: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        directive: Option<DirectiveId>,
        duration_ms: u64,
    },

    #[serde(rename = "request:failed")]
    RequestFailed {
        request_id: RequestId,
        service: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        directive: Option<DirectiveId>,
        error: String,
        will_retry: bool,
    },

    // -- workers --
    #[serde(rename = "worker:started")]
    WorkerStarted {
        worker_id: usize,
        request_id: RequestId,
        service: String,
    },

    #[serde(rename = "worker:output")]
    WorkerOutput {
        worker_id: usize,
        request_id: RequestId,
        event: StreamEvent,
    },

    // -- directives --
    #[serde(rename = "directive:phase-change")]
    DirectivePhaseChange {
        directive_id: DirectiveId,
        from: DirectivePhase,
        to: DirectivePhase,
        message: String,
    },

    #[serde(rename = "directive:test-result")]
    DirectiveTestResult {
        directive_id: DirectiveId,
        test_request_id: RequestId,
        passed: bool,
    },

    // -- services --
    #[serde(rename = "service:added")]
    ServiceAdded { service: String },

    #[serde(rename = "service:removed")]
    ServiceRemoved { service: String },

    // -- sessions --
    #[serde(rename = "session:created")]
    SessionCreated {
        service: String,
        session_id: String,
    },

    #[serde(rename = "session:rotated")]
    SessionRotated {
        service: String,
        session_id: String,
        reason: RotationReason,
    },
}

impl HubEvent {
    /// Topic string this event serializes under.
    pub fn topic(&self) -> &'static str {
        match self {
            HubEvent::SchedulerTick { .. } => "scheduler:tick",
            HubEvent::SyncPull { .. } => "sync:pull",
            HubEvent::SyncPush { .. } => "sync:push",
            HubEvent::RequestClaimed { .. } => "request:claimed",
            HubEvent::RequestCompleted { .. } => "request:completed",
            HubEvent::RequestFailed { .. } => "request:failed",
            HubEvent::WorkerStarted { .. } => "worker:started",
            HubEvent::WorkerOutput { .. } => "worker:output",
            HubEvent::DirectivePhaseChange { .. } => "directive:phase-change",
            HubEvent::DirectiveTestResult { .. } => "directive:test-result",
            HubEvent::ServiceAdded { .. } => "service:added",
            HubEvent::ServiceRemoved { .. } => "service:removed",
            HubEvent::SessionCreated { .. } => "session:created",
            HubEvent::SessionRotated { .. } => "session:rotated",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

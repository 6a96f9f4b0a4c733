// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake agent backend for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AgentBackend, AgentError, AgentInvocation, AgentOutcome};
use accord_core::{StreamEvent, TokenUsage};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// What the fake records about each invocation.
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    pub prompt: String,
    pub cwd: PathBuf,
    pub resume_session_id: Option<String>,
    pub model: Option<String>,
}

/// A scripted successful response.
#[derive(Debug, Clone)]
pub struct FakeResponse {
    pub session_id: String,
    pub text: String,
    pub cost_usd: f64,
    pub num_turns: u32,
}

impl Default for FakeResponse {
    fn default() -> Self {
        Self {
            session_id: "fake-session".to_string(),
            text: "done".to_string(),
            cost_usd: 0.01,
            num_turns: 1,
        }
    }
}

impl FakeResponse {
    pub fn with_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }
}

struct FakeState {
    calls: Vec<RecordedInvocation>,
    script: VecDeque<Result<FakeResponse, String>>,
    fail_always: Option<String>,
    delay: Option<Duration>,
    closed_all: bool,
}

/// Fake agent backend: scripted outcomes, recorded calls.
#[derive(Clone)]
pub struct FakeAgentBackend {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeAgentBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAgentBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                script: VecDeque::new(),
                fail_always: None,
                delay: None,
                closed_all: false,
            })),
        }
    }

    /// Fail every invocation with the given error text.
    pub fn failing_with(message: impl Into<String>) -> Self {
        let backend = Self::new();
        backend.inner.lock().fail_always = Some(message.into());
        backend
    }

    /// Respond with these session ids, in order, then the default.
    pub fn with_session_ids(ids: &[&str]) -> Self {
        let backend = Self::new();
        {
            let mut inner = backend.inner.lock();
            for id in ids {
                inner.script.push_back(Ok(FakeResponse::with_session(*id)));
            }
        }
        backend
    }

    /// Queue one scripted response.
    pub fn push_response(&self, response: FakeResponse) {
        self.inner.lock().script.push_back(Ok(response));
    }

    /// Queue one scripted failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.inner.lock().script.push_back(Err(message.into()));
    }

    /// Delay every invocation, to observe concurrency from tests.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<RecordedInvocation> {
        self.inner.lock().calls.clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    pub fn closed_all(&self) -> bool {
        self.inner.lock().closed_all
    }
}

#[async_trait::async_trait]
impl AgentBackend for FakeAgentBackend {
    async fn invoke(
        &self,
        invocation: AgentInvocation,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<AgentOutcome, AgentError> {
        let (scripted, delay) = {
            let mut inner = self.inner.lock();
            inner.calls.push(RecordedInvocation {
                prompt: invocation.prompt.clone(),
                cwd: invocation.cwd.clone(),
                resume_session_id: invocation.resume_session_id.clone(),
                model: invocation.model.clone(),
            });
            if let Some(message) = &inner.fail_always {
                (Err(message.clone()), inner.delay)
            } else {
                let next = inner.script.pop_front().unwrap_or(Ok(FakeResponse::default()));
                (next, inner.delay)
            }
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match scripted {
            Err(message) => Err(AgentError::Result(message)),
            Ok(response) => {
                let _ = events
                    .send(StreamEvent::Text {
                        text: response.text.clone(),
                    })
                    .await;
                Ok(AgentOutcome {
                    session_id: Some(response.session_id),
                    cost_usd: Some(response.cost_usd),
                    num_turns: Some(response.num_turns),
                    duration_ms: 1,
                    usage: Some(TokenUsage {
                        input_tokens: 100,
                        output_tokens: 10,
                        ..TokenUsage::default()
                    }),
                    model_usage: None,
                })
            }
        }
    }

    fn supports_resume(&self) -> bool {
        true
    }

    async fn close_all(&self) {
        self.inner.lock().closed_all = true;
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

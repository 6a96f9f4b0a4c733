// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent invocation backends.
//!
//! One capability set, three implementations:
//! - [`OneShotBackend`]: a fresh CLI process per invocation, resuming by
//!   session id (`claude-code`).
//! - [`PersistentBackend`]: a long-lived stream-JSON child per working
//!   directory (`claude-code-v2`).
//! - [`ShellBackend`]: an arbitrary command line given the prompt as its
//!   final argument (`shell`).
//!
//! All backends translate wire output into [`StreamEvent`]s on the caller's
//! channel, at least once per content block.

pub mod message;
mod oneshot;
mod persistent;
mod shell;

pub use oneshot::OneShotBackend;
pub use persistent::PersistentBackend;
pub use shell::ShellBackend;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAgentBackend, FakeResponse, RecordedInvocation};

use accord_core::{AgentKind, DispatchConfig, ModelUsage, StreamEvent, TokenUsage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Command line used by the `shell` backend when none is configured.
pub const DEFAULT_SHELL_AGENT_CMD: &str = "claude -p --dangerously-skip-permissions";

/// Errors from agent invocations.
///
/// The worker treats every variant as retryable; the retry budget caps
/// transient and fatal failures alike.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invocation timed out after {0}s")]
    Timeout(u64),
    #[error("agent spawn failed: {0}")]
    Spawn(String),
    #[error("agent reported an error: {0}")]
    Result(String),
    #[error("agent stream failed: {0}")]
    Stream(String),
    #[error("agent command exited with status {status}: {stderr}")]
    ShellFailure { status: i32, stderr: String },
    #[error("session busy for {0}")]
    Busy(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One agent invocation.
#[derive(Debug, Clone)]
pub struct AgentInvocation {
    pub prompt: String,
    pub cwd: PathBuf,
    /// Prior session to resume, if the backend supports it.
    pub resume_session_id: Option<String>,
    pub timeout: Duration,
    pub model: Option<String>,
    pub max_turns: Option<u32>,
    pub max_budget_usd: Option<f64>,
}

/// What an invocation reported back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentOutcome {
    pub session_id: Option<String>,
    pub cost_usd: Option<f64>,
    pub num_turns: Option<u32>,
    pub duration_ms: u64,
    pub usage: Option<TokenUsage>,
    pub model_usage: Option<HashMap<String, ModelUsage>>,
}

/// Uniform invocation contract over the agent backends.
#[async_trait]
pub trait AgentBackend: Clone + Send + Sync + 'static {
    /// Run one invocation to completion.
    ///
    /// Stream events are delivered on `events` as they arrive; the returned
    /// outcome summarizes the whole call. Implementations must abort the
    /// underlying work when `invocation.timeout` expires and surface it as
    /// [`AgentError::Timeout`].
    async fn invoke(
        &self,
        invocation: AgentInvocation,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<AgentOutcome, AgentError>;

    /// Whether `resume_session_id` is honored.
    fn supports_resume(&self) -> bool;

    /// Close any long-lived resources. Default is a no-op.
    async fn close_all(&self) {}
}

/// Backend selected by the `dispatch.agent` config tag.
#[derive(Clone)]
pub enum AgentRouter {
    OneShot(OneShotBackend),
    Persistent(PersistentBackend),
    Shell(ShellBackend),
}

impl AgentRouter {
    /// Build the configured backend.
    pub fn from_config(config: &DispatchConfig) -> Result<Self, AgentError> {
        match config.agent {
            AgentKind::ClaudeCode => Ok(AgentRouter::OneShot(OneShotBackend::new("claude"))),
            AgentKind::ClaudeCodeV2 => Ok(AgentRouter::Persistent(PersistentBackend::new(
                "claude",
                config.rotation_policy(),
            ))),
            AgentKind::Shell => {
                let cmd = config.agent_cmd.as_deref().unwrap_or(DEFAULT_SHELL_AGENT_CMD);
                Ok(AgentRouter::Shell(ShellBackend::from_command_line(cmd)?))
            }
        }
    }
}

#[async_trait]
impl AgentBackend for AgentRouter {
    async fn invoke(
        &self,
        invocation: AgentInvocation,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<AgentOutcome, AgentError> {
        match self {
            AgentRouter::OneShot(backend) => backend.invoke(invocation, events).await,
            AgentRouter::Persistent(backend) => backend.invoke(invocation, events).await,
            AgentRouter::Shell(backend) => backend.invoke(invocation, events).await,
        }
    }

    fn supports_resume(&self) -> bool {
        match self {
            AgentRouter::OneShot(backend) => backend.supports_resume(),
            AgentRouter::Persistent(backend) => backend.supports_resume(),
            AgentRouter::Shell(backend) => backend.supports_resume(),
        }
    }

    async fn close_all(&self) {
        match self {
            AgentRouter::OneShot(backend) => backend.close_all().await,
            AgentRouter::Persistent(backend) => backend.close_all().await,
            AgentRouter::Shell(backend) => backend.close_all().await,
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

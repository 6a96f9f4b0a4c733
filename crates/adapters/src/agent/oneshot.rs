// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot agent backend: a fresh CLI process per invocation.

use super::message::{self, AgentMessage, ResultMessage};
use super::{AgentBackend, AgentError, AgentInvocation, AgentOutcome};
use accord_core::StreamEvent;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// How long to wait for the child to exit after its result message.
const REAP_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend for the `claude-code` configuration tag.
///
/// Every invocation starts a new `{program} -p --output-format stream-json`
/// process, passes `--resume` when a session id is supplied, streams stdout
/// until the `result` record, then reaps the child.
#[derive(Debug, Clone)]
pub struct OneShotBackend {
    program: String,
}

impl OneShotBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, invocation: &AgentInvocation) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-p", "--output-format", "stream-json", "--verbose"]);
        if let Some(id) = &invocation.resume_session_id {
            cmd.args(["--resume", id]);
        }
        if let Some(model) = &invocation.model {
            cmd.args(["--model", model]);
        }
        if let Some(turns) = invocation.max_turns {
            cmd.args(["--max-turns", &turns.to_string()]);
        }
        if let Some(budget) = invocation.max_budget_usd {
            cmd.args(["--max-budget-usd", &budget.to_string()]);
        }
        cmd.arg(&invocation.prompt)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl AgentBackend for OneShotBackend {
    async fn invoke(
        &self,
        invocation: AgentInvocation,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<AgentOutcome, AgentError> {
        let started = Instant::now();
        let mut child = self
            .command(&invocation)
            .spawn()
            .map_err(|e| AgentError::Spawn(format!("{}: {}", self.program, e)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Stream("stdout not captured".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();

        let drain = async {
            let mut result: Option<ResultMessage> = None;
            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| AgentError::Stream(e.to_string()))?
            {
                let Some(record) = message::parse_line(&line) else {
                    continue;
                };
                for event in record.stream_events() {
                    let _ = events.send(event).await;
                }
                if let AgentMessage::Result(r) = record {
                    result = Some(r);
                    break;
                }
            }
            Ok::<_, AgentError>(result)
        };

        let result = match tokio::time::timeout(invocation.timeout, drain).await {
            Err(_) => {
                let _ = child.start_kill();
                return Err(AgentError::Timeout(invocation.timeout.as_secs()));
            }
            Ok(Err(e)) => {
                let _ = child.start_kill();
                return Err(e);
            }
            Ok(Ok(result)) => result,
        };

        // Reap the child; kill_on_drop covers a child that won't exit.
        let output = tokio::time::timeout(REAP_TIMEOUT, child.wait_with_output())
            .await
            .ok()
            .and_then(|r| r.ok());

        let result = match result {
            Some(result) => result,
            None => {
                let stderr = output
                    .map(|o| String::from_utf8_lossy(&o.stderr).trim().to_string())
                    .unwrap_or_default();
                return Err(AgentError::Stream(format!(
                    "stream ended without a result message: {stderr}"
                )));
            }
        };

        if result.is_error {
            return Err(AgentError::Result(result.error_message()));
        }

        Ok(AgentOutcome {
            session_id: result.session_id,
            cost_usd: result.total_cost_usd,
            num_turns: result.num_turns,
            duration_ms: started.elapsed().as_millis() as u64,
            usage: result.usage,
            model_usage: result.model_usage,
        })
    }

    fn supports_resume(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "oneshot_tests.rs"]
mod tests;

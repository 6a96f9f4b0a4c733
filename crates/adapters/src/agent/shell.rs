// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell agent backend: an arbitrary command line per invocation.
//!
//! The configured command is split shell-style and the prompt is appended
//! as the final argument. Only duration is reported; the captured stdout
//! arrives as a single `text` event.

use super::{AgentBackend, AgentError, AgentInvocation, AgentOutcome};
use crate::subprocess::read_limited;
use accord_core::StreamEvent;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::sync::mpsc;

/// Cap on captured stdout. Anything past this is dropped, not buffered.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Cap on captured stderr for error reporting.
const MAX_STDERR_BYTES: usize = 16 * 1024;

/// Backend for the `shell` configuration tag.
#[derive(Debug, Clone)]
pub struct ShellBackend {
    argv: Vec<String>,
    max_output_bytes: usize,
}

impl ShellBackend {
    /// Split a configured command line into argv.
    pub fn from_command_line(command: &str) -> Result<Self, AgentError> {
        let argv = shell_words::split(command)
            .map_err(|e| AgentError::Spawn(format!("bad agent_cmd: {e}")))?;
        if argv.is_empty() {
            return Err(AgentError::Spawn("agent_cmd is empty".to_string()));
        }
        Ok(Self {
            argv,
            max_output_bytes: MAX_OUTPUT_BYTES,
        })
    }

    #[cfg(test)]
    fn with_max_output(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

#[async_trait]
impl AgentBackend for ShellBackend {
    async fn invoke(
        &self,
        invocation: AgentInvocation,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<AgentOutcome, AgentError> {
        let started = Instant::now();

        let mut cmd = Command::new(&self.argv[0]);
        cmd.args(&self.argv[1..])
            .arg(&invocation.prompt)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| AgentError::Spawn(format!("{}: {}", self.argv[0], e)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Stream("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AgentError::Stream("stderr not captured".to_string()))?;

        let max_output = self.max_output_bytes;
        let run = async {
            let (stdout_text, truncated) = read_limited(stdout, max_output).await?;
            let (stderr_text, _) = read_limited(stderr, MAX_STDERR_BYTES).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((stdout_text, truncated, stderr_text, status))
        };

        let (stdout_text, truncated, stderr_text, status) =
            match tokio::time::timeout(invocation.timeout, run).await {
                Err(_) => {
                    return Err(AgentError::Timeout(invocation.timeout.as_secs()));
                }
                Ok(Err(e)) => return Err(AgentError::Stream(e.to_string())),
                Ok(Ok(parts)) => parts,
            };

        if truncated {
            tracing::warn!(
                max_bytes = max_output,
                "shell agent stdout truncated at buffer cap"
            );
        }

        if !status.success() {
            return Err(AgentError::ShellFailure {
                status: status.code().unwrap_or(-1),
                stderr: stderr_text.trim().to_string(),
            });
        }

        let _ = events
            .send(StreamEvent::Text { text: stdout_text })
            .await;

        Ok(AgentOutcome {
            duration_ms: started.elapsed().as_millis() as u64,
            ..AgentOutcome::default()
        })
    }

    fn supports_resume(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;

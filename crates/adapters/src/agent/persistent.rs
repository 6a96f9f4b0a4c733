// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent agent backend: one long-lived stream-JSON child per
//! working directory.
//!
//! The child is spawned with its own `cwd`, so no process-wide directory
//! changes are ever needed. A `busy` flag rejects overlapping sends on one
//! session; the dispatcher's per-directory serialization makes that flag a
//! defense-in-depth, not a lock.

use super::message::{self, AgentMessage, ResultMessage};
use super::{AgentBackend, AgentError, AgentInvocation, AgentOutcome};
use accord_core::{RotationPolicy, StreamEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;

/// I/O handles of a live session. Taken out of the map while an
/// invocation is in flight.
struct SessionIo {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl SessionIo {
    fn kill(mut self) {
        let _ = self.child.start_kill();
    }
}

struct ManagedSession {
    session_id: Option<String>,
    created_at: Instant,
    request_count: u32,
    busy: bool,
    io: Option<SessionIo>,
}

impl ManagedSession {
    /// Entry inserted while a fresh session is being spawned. `busy` from
    /// the start so concurrent invokes on the same directory bounce.
    fn placeholder() -> Self {
        Self {
            session_id: None,
            created_at: Instant::now(),
            request_count: 0,
            busy: true,
            io: None,
        }
    }
}

/// Backend for the `claude-code-v2` configuration tag.
#[derive(Clone)]
pub struct PersistentBackend {
    program: String,
    policy: RotationPolicy,
    sessions: Arc<Mutex<HashMap<PathBuf, ManagedSession>>>,
}

enum Claim {
    /// Reuse the live session's I/O.
    Reuse(SessionIo),
    /// No session yet (placeholder inserted); spawn one.
    Fresh,
    /// Session hit a rotation cap; kill it and spawn a replacement.
    Rotate(Option<SessionIo>),
}

impl PersistentBackend {
    pub fn new(program: impl Into<String>, policy: RotationPolicy) -> Self {
        Self {
            program: program.into(),
            policy,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of live sessions (for diagnostics and tests).
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Backend-reported session id for a working directory, if any.
    pub fn session_id_for(&self, cwd: &Path) -> Option<String> {
        self.sessions.lock().get(cwd).and_then(|s| s.session_id.clone())
    }

    fn claim(&self, cwd: &Path) -> Result<Claim, AgentError> {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(cwd) {
            Some(session) if session.busy => Err(AgentError::Busy(cwd.display().to_string())),
            Some(session) => {
                let over_count = session.request_count >= self.policy.max_requests;
                let over_age =
                    session.created_at.elapsed().as_millis() as u64 >= self.policy.max_age_ms;
                if over_count || over_age {
                    let old = sessions.remove(cwd).and_then(|s| s.io);
                    sessions.insert(cwd.to_path_buf(), ManagedSession::placeholder());
                    Ok(Claim::Rotate(old))
                } else {
                    session.busy = true;
                    match session.io.take() {
                        Some(io) => Ok(Claim::Reuse(io)),
                        // Should not happen: io is only absent while busy
                        None => Err(AgentError::Busy(cwd.display().to_string())),
                    }
                }
            }
            None => {
                sessions.insert(cwd.to_path_buf(), ManagedSession::placeholder());
                Ok(Claim::Fresh)
            }
        }
    }

    fn spawn_session(&self, invocation: &AgentInvocation) -> Result<SessionIo, AgentError> {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "--input-format",
            "stream-json",
            "--output-format",
            "stream-json",
            "--verbose",
        ]);
        if let Some(id) = &invocation.resume_session_id {
            cmd.args(["--resume", id]);
        }
        if let Some(model) = &invocation.model {
            cmd.args(["--model", model]);
        }
        cmd.current_dir(&invocation.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| AgentError::Spawn(format!("{}: {}", self.program, e)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Stream("stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Stream("stdout not captured".to_string()))?;
        Ok(SessionIo {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        })
    }

    /// Send the prompt and drain the stream until a result record,
    /// leaving the stream open for the next call.
    async fn converse(
        io: &mut SessionIo,
        prompt: &str,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<ResultMessage, AgentError> {
        let frame = serde_json::json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": [{"type": "text", "text": prompt}],
            },
        });
        let mut line = frame.to_string();
        line.push('\n');
        io.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| AgentError::Stream(format!("send failed: {e}")))?;
        io.stdin
            .flush()
            .await
            .map_err(|e| AgentError::Stream(format!("send failed: {e}")))?;

        while let Some(line) = io
            .lines
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
            if let AgentMessage::Result(result) = record {
                return Ok(result);
            }
        }
        Err(AgentError::Stream(
            "session closed without a result message".to_string(),
        ))
    }

    fn release_success(&self, cwd: &Path, io: SessionIo, session_id: Option<String>) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(cwd) {
            session.busy = false;
            session.io = Some(io);
            session.request_count += 1;
            if session_id.is_some() {
                session.session_id = session_id;
            }
        } else {
            // close_all raced us; don't leak the child
            io.kill();
        }
    }

    fn discard(&self, cwd: &Path, io: Option<SessionIo>) {
        if let Some(io) = io {
            io.kill();
        }
        self.sessions.lock().remove(cwd);
    }
}

#[async_trait]
impl AgentBackend for PersistentBackend {
    async fn invoke(
        &self,
        invocation: AgentInvocation,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<AgentOutcome, AgentError> {
        let started = Instant::now();
        let cwd = invocation.cwd.clone();

        let mut io = match self.claim(&cwd)? {
            Claim::Reuse(io) => {
                if invocation.resume_session_id.is_some() {
                    // A live session takes precedence over an explicit
                    // resume id; log the dropped id for the record.
                    tracing::debug!(
                        cwd = %cwd.display(),
                        dropped = invocation.resume_session_id.as_deref(),
                        "ignoring resume id, live session exists"
                    );
                }
                io
            }
            Claim::Fresh => match self.spawn_session(&invocation) {
                Ok(io) => io,
                Err(e) => {
                    self.discard(&cwd, None);
                    return Err(e);
                }
            },
            Claim::Rotate(old) => {
                tracing::info!(cwd = %cwd.display(), "rotating persistent session");
                if let Some(old) = old {
                    old.kill();
                }
                match self.spawn_session(&invocation) {
                    Ok(io) => io,
                    Err(e) => {
                        self.discard(&cwd, None);
                        return Err(e);
                    }
                }
            }
        };

        let drained =
            tokio::time::timeout(invocation.timeout, Self::converse(&mut io, &invocation.prompt, &events))
                .await;

        match drained {
            Err(_) => {
                self.discard(&cwd, Some(io));
                Err(AgentError::Timeout(invocation.timeout.as_secs()))
            }
            Ok(Err(e)) => {
                self.discard(&cwd, Some(io));
                Err(e)
            }
            Ok(Ok(result)) if result.is_error => {
                self.discard(&cwd, Some(io));
                Err(AgentError::Result(result.error_message()))
            }
            Ok(Ok(result)) => {
                let session_id = result.session_id.clone();
                self.release_success(&cwd, io, session_id.clone());
                Ok(AgentOutcome {
                    session_id,
                    cost_usd: result.total_cost_usd,
                    num_turns: result.num_turns,
                    duration_ms: started.elapsed().as_millis() as u64,
                    usage: result.usage,
                    model_usage: result.model_usage,
                })
            }
        }
    }

    fn supports_resume(&self) -> bool {
        true
    }

    /// Close every managed session.
    async fn close_all(&self) {
        let drained: Vec<ManagedSession> = {
            let mut sessions = self.sessions.lock();
            sessions.drain().map(|(_, session)| session).collect()
        };
        for session in drained {
            if let Some(io) = session.io {
                io.kill();
            }
        }
    }
}

#[cfg(test)]
#[path = "persistent_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use tempfile::TempDir;

fn invocation(cwd: &std::path::Path, prompt: &str) -> AgentInvocation {
    AgentInvocation {
        prompt: prompt.to_string(),
        cwd: cwd.to_path_buf(),
        resume_session_id: None,
        timeout: Duration::from_secs(5),
        model: None,
        max_turns: None,
        max_budget_usd: None,
    }
}

#[tokio::test]
async fn prompt_is_appended_and_stdout_streams_as_text() {
    let tmp = TempDir::new().unwrap();
    let backend = ShellBackend::from_command_line("echo agent says").unwrap();
    let (tx, mut rx) = mpsc::channel(16);

    let outcome = backend
        .invoke(invocation(tmp.path(), "hello"), tx)
        .await
        .unwrap();

    assert!(outcome.session_id.is_none());
    assert!(outcome.cost_usd.is_none());
    assert_eq!(
        rx.recv().await.unwrap(),
        StreamEvent::Text {
            text: "agent says hello\n".to_string()
        }
    );
}

#[tokio::test]
async fn does_not_resume() {
    let backend = ShellBackend::from_command_line("echo hi").unwrap();
    assert!(!backend.supports_resume());
}

#[tokio::test]
async fn nonzero_exit_surfaces_status_and_stderr() {
    let tmp = TempDir::new().unwrap();
    let backend =
        ShellBackend::from_command_line("bash -c 'echo broken >&2; exit 3'").unwrap();
    let (tx, _rx) = mpsc::channel(16);

    let err = backend
        .invoke(invocation(tmp.path(), "ignored"), tx)
        .await
        .unwrap_err();

    let AgentError::ShellFailure { status, stderr } = err else {
        panic!("expected shell failure, got {err:?}");
    };
    assert_eq!(status, 3);
    assert_eq!(stderr, "broken");
}

#[tokio::test]
async fn timeout_aborts_the_command() {
    let tmp = TempDir::new().unwrap();
    let backend = ShellBackend::from_command_line("sleep").unwrap();
    let (tx, _rx) = mpsc::channel(16);

    let mut call = invocation(tmp.path(), "30");
    call.timeout = Duration::from_millis(100);

    let started = std::time::Instant::now();
    let err = backend.invoke(call, tx).await.unwrap_err();
    assert!(matches!(err, AgentError::Timeout(_)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn stdout_is_bounded() {
    let tmp = TempDir::new().unwrap();
    let backend = ShellBackend::from_command_line("bash -c 'printf xxxxxxxxxxxxxxxxxxxx'")
        .unwrap()
        .with_max_output(8);
    let (tx, mut rx) = mpsc::channel(16);

    backend
        .invoke(invocation(tmp.path(), "ignored"), tx)
        .await
        .unwrap();

    let StreamEvent::Text { text } = rx.recv().await.unwrap() else {
        panic!("expected text event");
    };
    assert_eq!(text, "xxxxxxxx");
}

#[test]
fn command_line_splitting() {
    let backend = ShellBackend::from_command_line("claude -p --model opus").unwrap();
    assert_eq!(backend.argv(), &["claude", "-p", "--model", "opus"]);

    assert!(ShellBackend::from_command_line("").is_err());
    assert!(ShellBackend::from_command_line("bad 'quote").is_err());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use accord_core::{AgentKind, RepoModel};

const VALID: &str = r#"
project:
  name: demo
repo_model: multi-repo
services:
  - name: backend
    dir: repos/backend
  - name: frontend
dispatch:
  workers: 4
  poll_interval: 10
  agent: claude-code-v2
coordination:
  test_agent_service: qa
"#;

#[test]
fn loads_a_full_config() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    std::fs::write(&path, VALID).unwrap();

    let config = load_hub_config(&path).unwrap();
    assert_eq!(config.project.name, "demo");
    assert_eq!(config.repo_model, RepoModel::MultiRepo);
    assert_eq!(config.services.len(), 2);
    assert_eq!(config.dispatch.workers, 4);
    assert_eq!(config.dispatch.agent, AgentKind::ClaudeCodeV2);
    // Unspecified dispatch knobs keep their defaults
    assert_eq!(config.dispatch.max_attempts, 3);
    assert_eq!(
        config.coordination.test_agent_service.as_deref(),
        Some("qa")
    );
}

#[test]
fn missing_file_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_hub_config(&tmp.path().join("config.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn invalid_yaml_is_a_parse_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    std::fs::write(&path, "project: [unterminated\n").unwrap();
    assert!(matches!(
        load_hub_config(&path).unwrap_err(),
        ConfigError::Parse(_)
    ));
}

#[test]
fn validation_failures_bubble_up() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    std::fs::write(&path, "project:\n  name: demo\nservices: []\n").unwrap();
    assert!(matches!(
        load_hub_config(&path).unwrap_err(),
        ConfigError::NoServices
    ));
}

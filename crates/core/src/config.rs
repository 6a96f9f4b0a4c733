// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hub configuration (`config.yaml` schema and validation).

use crate::session::RotationPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating hub configuration.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(String),
    #[error("config is missing project.name")]
    MissingProjectName,
    #[error("config declares no services")]
    NoServices,
    #[error("duplicate service name: {0}")]
    DuplicateService(String),
}

/// Project identity block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,
}

/// One service participating in the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    /// Working directory for the service in multi-repo mode. Relative paths
    /// resolve against the hub root; absent means a sibling of the hub.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: None,
        }
    }
}

/// How service working directories relate to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepoModel {
    /// All services share the hub directory.
    Monorepo,
    /// Each service has its own working directory.
    MultiRepo,
}

impl Default for RepoModel {
    fn default() -> Self {
        RepoModel::Monorepo
    }
}

/// Which agent backend the workers invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    #[serde(rename = "claude-code")]
    ClaudeCode,
    #[serde(rename = "claude-code-v2")]
    ClaudeCodeV2,
    #[serde(rename = "shell")]
    Shell,
}

impl Default for AgentKind {
    fn default() -> Self {
        AgentKind::ClaudeCode
    }
}

fn default_workers() -> usize {
    2
}
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_session_max_requests() -> u32 {
    10
}
fn default_session_max_age_hours() -> u64 {
    4
}
fn default_request_timeout_secs() -> u64 {
    600
}
fn default_max_attempts() -> u32 {
    3
}

/// Dispatcher and worker-pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_poll_interval_secs", rename = "poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_session_max_requests")]
    pub session_max_requests: u32,
    #[serde(default = "default_session_max_age_hours")]
    pub session_max_age_hours: u64,
    #[serde(default = "default_request_timeout_secs", rename = "request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_budget_usd: Option<f64>,
    #[serde(default)]
    pub agent: AgentKind,
    /// Command line for the `shell` agent backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_cmd: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            poll_interval_secs: default_poll_interval_secs(),
            session_max_requests: default_session_max_requests(),
            session_max_age_hours: default_session_max_age_hours(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            model: None,
            max_budget_usd: None,
            agent: AgentKind::default(),
            agent_cmd: None,
        }
    }
}

impl DispatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy {
            max_requests: self.session_max_requests,
            max_age_ms: self.session_max_age_hours * 3_600_000,
        }
    }
}

fn default_coordination_max_retries() -> u32 {
    3
}

/// Directive coordination settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinationConfig {
    /// Service that receives generated test requests. Absent means
    /// implementation completion finishes the directive directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_agent_service: Option<String>,
    #[serde(default = "default_coordination_max_retries")]
    pub max_retries: u32,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            test_agent_service: None,
            max_retries: default_coordination_max_retries(),
        }
    }
}

/// Top-level hub configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub repo_model: RepoModel,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub coordination: CoordinationConfig,
}

impl HubConfig {
    /// Check startup invariants. Errors here abort the process.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.name.trim().is_empty() {
            return Err(ConfigError::MissingProjectName);
        }
        if self.services.is_empty() {
            return Err(ConfigError::NoServices);
        }
        let mut seen = std::collections::HashSet::new();
        for service in &self.services {
            if !seen.insert(service.name.as_str()) {
                return Err(ConfigError::DuplicateService(service.name.clone()));
            }
        }
        Ok(())
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Working directory for a service.
    ///
    /// Monorepo: the hub root. Multi-repo: the configured directory
    /// (relative paths resolve against the hub root), defaulting to a
    /// sibling directory named after the service.
    pub fn service_dir(&self, service: &str, hub_root: &Path) -> PathBuf {
        match self.repo_model {
            RepoModel::Monorepo => hub_root.to_path_buf(),
            RepoModel::MultiRepo => match self.service(service).and_then(|s| s.dir.clone()) {
                Some(dir) if dir.is_absolute() => dir,
                Some(dir) => hub_root.join(dir),
                None => hub_root
                    .parent()
                    .map(|parent| parent.join(service))
                    .unwrap_or_else(|| hub_root.to_path_buf()),
            },
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request records and their frontmatter schema.

use crate::id::{DirectiveId, RequestId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Reserved request `type` routed through the command fast-path.
pub const COMMAND_TYPE: &str = "command";

/// Request urgency. Lower rank dispatches first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank: critical < high < medium < low.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => write!(f, "critical"),
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Which boundary a request crosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    External,
    Internal,
    CrossTeam,
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Internal
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::External => write!(f, "external"),
            Scope::Internal => write!(f, "internal"),
            Scope::CrossTeam => write!(f, "cross-team"),
        }
    }
}

/// Request lifecycle status.
///
/// Monotonic except for the controlled pending <-> in-progress oscillation
/// on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    Approved,
    InProgress,
    Completed,
    Failed,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Completed | RequestStatus::Failed | RequestStatus::Rejected
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Approved => write!(f, "approved"),
            RequestStatus::InProgress => write!(f, "in-progress"),
            RequestStatus::Completed => write!(f, "completed"),
            RequestStatus::Failed => write!(f, "failed"),
            RequestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

fn default_kind() -> String {
    "task".to_string()
}

/// Frontmatter of a request file.
///
/// Unknown keys round-trip through `extra` so operator tooling can attach
/// its own metadata without the hub dropping it on rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestHeader {
    pub id: RequestId,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub priority: Priority,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<DirectiveId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_contract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originated_from: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on_requests: Vec<RequestId>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RequestHeader {
    /// Minimal pending header addressed to a service.
    pub fn new(id: impl Into<RequestId>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: String::new(),
            to: to.into(),
            scope: Scope::default(),
            kind: default_kind(),
            priority: Priority::default(),
            status: RequestStatus::Pending,
            created: None,
            updated: None,
            attempts: 0,
            command: None,
            command_args: None,
            directive: None,
            related_contract: None,
            originated_from: None,
            depends_on_requests: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// A request file: parsed frontmatter plus its Markdown body and origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub header: RequestHeader,
    /// Markdown body following the frontmatter block, verbatim.
    pub body: String,
    /// Path the request was parsed from.
    pub path: PathBuf,
    /// Service owning the inbox this request sits in (path segment after
    /// `inbox`; falls back to the `to` field for archived requests).
    pub service: String,
}

impl Request {
    pub fn id(&self) -> &RequestId {
        &self.header.id
    }

    pub fn status(&self) -> RequestStatus {
        self.header.status
    }

    pub fn priority(&self) -> Priority {
        self.header.priority
    }

    pub fn is_command(&self) -> bool {
        self.header.kind == COMMAND_TYPE
    }

    /// Creation time, treating an absent `created` as the epoch so that
    /// undated requests sort ahead of dated ones deterministically.
    pub fn created_or_epoch(&self) -> DateTime<Utc> {
        self.header.created.unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directive records and their phase machine vocabulary.
//!
//! A directive is a multi-request unit of work. The Coordinator advances it
//! through `planning -> negotiating -> implementing -> testing` in reaction
//! to request completions; the transition rules live in the engine, this
//! module only carries the data.

use crate::id::{DirectiveId, RequestId};
use crate::request::Priority;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Phase of a directive's coordination state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectivePhase {
    Planning,
    Negotiating,
    Implementing,
    Testing,
    Completed,
    Failed,
}

impl DirectivePhase {
    /// Terminal phases admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, DirectivePhase::Completed | DirectivePhase::Failed)
    }

    /// Parse an operator-supplied phase name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planning" => Some(DirectivePhase::Planning),
            "negotiating" => Some(DirectivePhase::Negotiating),
            "implementing" => Some(DirectivePhase::Implementing),
            "testing" => Some(DirectivePhase::Testing),
            "completed" => Some(DirectivePhase::Completed),
            "failed" => Some(DirectivePhase::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for DirectivePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectivePhase::Planning => write!(f, "planning"),
            DirectivePhase::Negotiating => write!(f, "negotiating"),
            DirectivePhase::Implementing => write!(f, "implementing"),
            DirectivePhase::Testing => write!(f, "testing"),
            DirectivePhase::Completed => write!(f, "completed"),
            DirectivePhase::Failed => write!(f, "failed"),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

/// Frontmatter of a directive file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveHeader {
    pub id: DirectiveId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    pub status: DirectivePhase,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Every request spawned for this directive, in creation order.
    #[serde(default)]
    pub requests: Vec<RequestId>,
    /// Subset of `requests` that negotiate contracts.
    #[serde(default)]
    pub contract_proposals: Vec<RequestId>,
    /// Subset of `requests` that validate the implementation.
    #[serde(default)]
    pub test_requests: Vec<RequestId>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DirectiveHeader {
    pub fn new(id: impl Into<DirectiveId>, status: DirectivePhase) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            priority: Priority::default(),
            status,
            retry_count: 0,
            max_retries: default_max_retries(),
            requests: Vec::new(),
            contract_proposals: Vec::new(),
            test_requests: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// A directive file: parsed frontmatter plus its Markdown body and origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub header: DirectiveHeader,
    pub body: String,
    pub path: PathBuf,
}

impl Directive {
    pub fn id(&self) -> &DirectiveId {
        &self.header.id
    }

    pub fn phase(&self) -> DirectivePhase {
        self.header.status
    }

    /// Requests that implement the directive: everything in `requests` that
    /// is neither a contract proposal nor a test request.
    pub fn implementation_requests(&self) -> Vec<&RequestId> {
        let reserved: HashSet<&RequestId> = self
            .header
            .contract_proposals
            .iter()
            .chain(self.header.test_requests.iter())
            .collect();
        self.header
            .requests
            .iter()
            .filter(|id| !reserved.contains(*id))
            .collect()
    }

    /// Whether any of the directive's request lists mention `id`.
    pub fn owns_request(&self, id: &RequestId) -> bool {
        self.header.requests.contains(id)
            || self.header.contract_proposals.contains(id)
            || self.header.test_requests.contains(id)
    }
}

#[cfg(test)]
#[path = "directive_tests.rs"]
mod tests;

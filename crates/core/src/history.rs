// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only history records.

use crate::id::{DirectiveId, RequestId};
use crate::request::RequestStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token totals for one invocation, bucketed the way the agent backend
/// reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens
            + self.output_tokens
            + self.cache_creation_input_tokens
            + self.cache_read_input_tokens
    }
}

/// Per-model usage breakdown.
///
/// Field names mirror the backend's wire format verbatim so records can be
/// compared against raw result messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    #[serde(default, rename = "inputTokens")]
    pub input_tokens: u64,
    #[serde(default, rename = "outputTokens")]
    pub output_tokens: u64,
    #[serde(default, rename = "cacheReadInputTokens")]
    pub cache_read_input_tokens: u64,
    #[serde(default, rename = "cacheCreationInputTokens")]
    pub cache_creation_input_tokens: u64,
    #[serde(default, rename = "costUSD")]
    pub cost_usd: f64,
}

/// One line in `comms/history/YYYY-MM-DD-{actor}.jsonl`.
///
/// Immutable once written; the log is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts: DateTime<Utc>,
    pub request_id: RequestId,
    pub from_status: RequestStatus,
    pub to_status: RequestStatus,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive_id: Option<DirectiveId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_turns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_usage: Option<HashMap<String, ModelUsage>>,
}

impl HistoryEntry {
    /// A bare transition record; enrichment fields start empty.
    pub fn transition(
        ts: DateTime<Utc>,
        request_id: RequestId,
        from_status: RequestStatus,
        to_status: RequestStatus,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            ts,
            request_id,
            from_status,
            to_status,
            actor: actor.into(),
            directive_id: None,
            detail: None,
            duration_ms: None,
            cost_usd: None,
            num_turns: None,
            usage: None,
            model_usage: None,
        }
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;

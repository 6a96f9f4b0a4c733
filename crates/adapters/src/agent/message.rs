// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire messages from stream-JSON agent backends.
//!
//! The backends print one JSON object per line. Only four record types
//! matter to the hub: `system` (init), `assistant`, `user`, and `result`.
//! Everything else deserializes to [`AgentMessage::Unknown`] and is
//! ignored rather than treated as a stream error.

use accord_core::{ModelUsage, StreamEvent, TokenUsage};
use serde::Deserialize;
use std::collections::HashMap;

/// One line of backend output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentMessage {
    System(SystemMessage),
    Assistant(WrappedMessage),
    User(WrappedMessage),
    Result(ResultMessage),
    #[serde(other)]
    Unknown,
}

/// `system` records; `subtype: init` carries the session id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SystemMessage {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// `assistant` / `user` records wrap an API message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WrappedMessage {
    #[serde(default)]
    pub message: MessageBody,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// Content blocks inside an API message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        #[serde(default)]
        content: serde_json::Value,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Unknown,
}

/// Terminal `result` record for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultMessage {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    #[serde(default)]
    pub num_turns: Option<u32>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
    #[serde(default, rename = "modelUsage")]
    pub model_usage: Option<HashMap<String, ModelUsage>>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ResultMessage {
    /// Human-readable error text for an `is_error` result: the joined
    /// error strings, falling back to the result text or subtype.
    pub fn error_message(&self) -> String {
        if !self.errors.is_empty() {
            return self.errors.join("; ");
        }
        if let Some(result) = self.result.as_deref().filter(|s| !s.is_empty()) {
            return result.to_string();
        }
        self.subtype
            .clone()
            .unwrap_or_else(|| "unknown agent error".to_string())
    }
}

/// Parse one stdout line. Non-JSON noise returns `None`.
pub fn parse_line(line: &str) -> Option<AgentMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparseable backend line");
            None
        }
    }
}

/// Flatten a tool-result `content` value to display text.
fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl ContentBlock {
    fn stream_event(&self) -> Option<StreamEvent> {
        match self {
            ContentBlock::Text { text } => Some(StreamEvent::Text { text: text.clone() }),
            ContentBlock::Thinking { thinking } => Some(StreamEvent::Thinking {
                text: thinking.clone(),
            }),
            ContentBlock::ToolUse { name, input } => Some(StreamEvent::ToolUse {
                name: name.clone(),
                input: input.clone(),
            }),
            ContentBlock::ToolResult { content, is_error } => Some(StreamEvent::ToolResult {
                output: value_text(content),
                is_error: *is_error,
            }),
            ContentBlock::Unknown => None,
        }
    }
}

impl AgentMessage {
    /// Translate this record into zero or more stream events.
    pub fn stream_events(&self) -> Vec<StreamEvent> {
        match self {
            AgentMessage::System(system) => vec![StreamEvent::Status {
                status: system
                    .subtype
                    .clone()
                    .unwrap_or_else(|| "system".to_string()),
            }],
            AgentMessage::Assistant(wrapped) | AgentMessage::User(wrapped) => wrapped
                .message
                .content
                .iter()
                .filter_map(ContentBlock::stream_event)
                .collect(),
            AgentMessage::Result(_) | AgentMessage::Unknown => Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent session records and rotation policy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Live association between a service and an agent-side resumable session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub service: String,
    pub created_at_ms: u64,
    pub last_used_at_ms: u64,
    pub request_count: u32,
}

impl SessionRecord {
    /// Record a freshly created session with one use on the books.
    pub fn new(service: impl Into<String>, session_id: impl Into<String>, now_ms: u64) -> Self {
        Self {
            session_id: session_id.into(),
            service: service.into(),
            created_at_ms: now_ms,
            last_used_at_ms: now_ms,
            request_count: 1,
        }
    }

    /// Register another use, adopting the latest session id the backend
    /// reported.
    pub fn record_use(&mut self, session_id: impl Into<String>, now_ms: u64) {
        self.session_id = session_id.into();
        self.last_used_at_ms = now_ms;
        self.request_count += 1;
    }

    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at_ms)
    }
}

/// Why a session was rotated out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationReason {
    RequestCount,
    Age,
    Error,
}

impl fmt::Display for RotationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationReason::RequestCount => write!(f, "request count"),
            RotationReason::Age => write!(f, "age"),
            RotationReason::Error => write!(f, "error"),
        }
    }
}

/// Caps after which a session must be closed and replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_requests: u32,
    pub max_age_ms: u64,
}

impl RotationPolicy {
    /// Check whether `record` is due for rotation at `now_ms`.
    pub fn due(&self, record: &SessionRecord, now_ms: u64) -> Option<RotationReason> {
        if record.request_count >= self.max_requests {
            return Some(RotationReason::RequestCount);
        }
        if record.age_ms(now_ms) >= self.max_age_ms {
            return Some(RotationReason::Age);
        }
        None
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

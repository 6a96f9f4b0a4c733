// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! accord-adapters: agent backends and the sync transport.
//!
//! Everything external to the hub process lives behind a trait here: the
//! three agent backends (`claude-code`, `claude-code-v2`, `shell`) behind
//! [`AgentBackend`], and git behind [`SyncTransport`].

pub mod agent;
pub mod subprocess;
pub mod sync;

pub use agent::{
    AgentBackend, AgentError, AgentInvocation, AgentOutcome, AgentRouter, OneShotBackend,
    PersistentBackend, ShellBackend, DEFAULT_SHELL_AGENT_CMD,
};
pub use sync::{GitSync, SyncError, SyncTransport};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use agent::{FakeAgentBackend, FakeResponse, RecordedInvocation};
#[cfg(any(test, feature = "test-support"))]
pub use sync::{FakeSync, SyncCall};

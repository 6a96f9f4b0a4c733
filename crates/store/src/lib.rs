// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! accord-store: filesystem persistence for the Accord hub.
//!
//! The hub directory is the authoritative store. Everything here is
//! plain-file I/O: Markdown-with-frontmatter requests and directives,
//! JSONL history, JSON session maps, and text checkpoints. All rewrites go
//! through write-then-rename so a crash never leaves a file without valid
//! frontmatter.

pub mod checkpoint;
pub mod codec;
pub mod config;
pub mod directives;
pub mod frontmatter;
pub mod history;
pub mod layout;
pub mod scanner;
pub mod sessions;

use std::path::PathBuf;
use thiserror::Error;

pub use checkpoint::CheckpointStore;
pub use codec::{
    append_result, archive, increment_attempts, parse_request, render_request, set_status,
    update_field, write_request,
};
pub use config::load_hub_config;
pub use directives::{directive_path, parse_directive, write_directive};
pub use history::HistoryLog;
pub use layout::HubLayout;
pub use scanner::{
    dispatchable, scan_all, scan_archive, scan_directives, scan_inboxes, sort_by_priority,
};
pub use sessions::{load_sessions, save_sessions};

/// Errors from hub filesystem operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path}: missing frontmatter block")]
    MissingFrontmatter { path: PathBuf },
    #[error("{path}: invalid frontmatter: {message}")]
    InvalidFrontmatter { path: PathBuf, message: String },
    #[error("{path}: invalid json: {message}")]
    InvalidJson { path: PathBuf, message: String },
    #[error("failed to serialize: {0}")]
    Serialize(String),
}

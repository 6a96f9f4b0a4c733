// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox, archive, and directive scanning.
//!
//! Parse failures are logged and skipped here; a malformed file never
//! reaches the worker pool.

use crate::codec::parse_request;
use crate::directives::parse_directive;
use crate::layout::HubLayout;
use accord_core::{Directive, Request, RequestStatus};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Request files look like `req-*.md`; everything else is ignored.
fn is_request_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("req-") && name.ends_with(".md"))
}

/// Entries of `dir`, name-sorted for deterministic scan order.
fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    paths
}

fn scan_request_dir(dir: &Path) -> Vec<Request> {
    let mut requests = Vec::new();
    for path in sorted_entries(dir) {
        if !is_request_file(&path) {
            continue;
        }
        match parse_request(&path) {
            Ok(request) => requests.push(request),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unparseable request"),
        }
    }
    requests
}

/// Walk every service inbox (including the orchestrator's).
pub fn scan_inboxes(layout: &HubLayout) -> Vec<Request> {
    let mut requests = Vec::new();
    for dir in sorted_entries(&layout.inbox_root()) {
        if dir.is_dir() {
            requests.extend(scan_request_dir(&dir));
        }
    }
    requests
}

/// Walk the archive of terminal requests.
pub fn scan_archive(layout: &HubLayout) -> Vec<Request> {
    scan_request_dir(&layout.archive_dir())
}

/// Inboxes plus archive: the full set of known requests.
pub fn scan_all(layout: &HubLayout) -> Vec<Request> {
    let mut requests = scan_inboxes(layout);
    requests.extend(scan_archive(layout));
    requests
}

/// Walk `directives/*.md`.
pub fn scan_directives(layout: &HubLayout) -> Vec<Directive> {
    let mut directives = Vec::new();
    for path in sorted_entries(&layout.directives_dir()) {
        if path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }
        match parse_directive(&path) {
            Ok(directive) => directives.push(directive),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unparseable directive"),
        }
    }
    directives
}

/// Pending requests whose dependencies are all observed completed.
///
/// `requests` must include both inbox and archive records, since
/// dependencies commonly complete and get archived before dependents run.
pub fn dispatchable(requests: &[Request]) -> Vec<Request> {
    let completed: HashSet<&str> = requests
        .iter()
        .filter(|r| r.status() == RequestStatus::Completed)
        .map(|r| r.id().as_str())
        .collect();

    requests
        .iter()
        .filter(|r| r.status() == RequestStatus::Pending)
        .filter(|r| {
            r.header
                .depends_on_requests
                .iter()
                .all(|dep| completed.contains(dep.as_str()))
        })
        .cloned()
        .collect()
}

/// Stable sort: priority rank ascending, then `created` ascending.
pub fn sort_by_priority(requests: &mut [Request]) {
    requests.sort_by_key(|r| (r.priority().rank(), r.created_or_epoch()));
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request file codec: parse and mutate Markdown-with-frontmatter requests.
//!
//! Mutations operate on the raw YAML mapping rather than the typed header
//! so unknown keys survive every rewrite. Callers must hold the request
//! claim; concurrent writes to one file are not supported.

use crate::frontmatter;
use crate::layout::HubLayout;
use crate::StoreError;
use accord_core::{Request, RequestHeader, RequestStatus};
use chrono::{SecondsFormat, Utc};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Write `contents` to `path` via a sibling temp file and rename.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Derive the service name from the path segment after the literal `inbox`
/// component. Archived requests have no inbox segment and return `None`.
pub fn service_from_path(path: &Path) -> Option<String> {
    let mut components = path.components();
    while let Some(component) = components.next() {
        if component.as_os_str() == "inbox" {
            let next = components.next()?;
            let name = next.as_os_str().to_str()?;
            if name.ends_with(".md") {
                return None;
            }
            return Some(name.to_string());
        }
    }
    None
}

/// Parse a request file.
///
/// Fails when the frontmatter block is missing or lacks `id`/`status`.
pub fn parse_request(path: &Path) -> Result<Request, StoreError> {
    let text = fs::read_to_string(path)?;
    let (yaml, body) = frontmatter::split(&text).ok_or_else(|| StoreError::MissingFrontmatter {
        path: path.to_path_buf(),
    })?;
    let header: RequestHeader =
        serde_yaml::from_str(yaml).map_err(|e| StoreError::InvalidFrontmatter {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let service = service_from_path(path).unwrap_or_else(|| header.to.clone());
    Ok(Request {
        header,
        body: body.to_string(),
        path: path.to_path_buf(),
        service,
    })
}

/// Render a request document from a typed header and body.
pub fn render_request(header: &RequestHeader, body: &str) -> Result<String, StoreError> {
    let yaml = serde_yaml::to_string(header).map_err(|e| StoreError::Serialize(e.to_string()))?;
    Ok(frontmatter::render(&yaml, body))
}

/// Write a new request file atomically.
pub fn write_request(path: &Path, header: &RequestHeader, body: &str) -> Result<(), StoreError> {
    write_atomic(path, &render_request(header, body)?)
}

/// Rewrite the frontmatter mapping in place, preserving the body.
fn edit_mapping<R>(path: &Path, edit: impl FnOnce(&mut Mapping) -> R) -> Result<R, StoreError> {
    let text = fs::read_to_string(path)?;
    let (yaml, body) = frontmatter::split(&text).ok_or_else(|| StoreError::MissingFrontmatter {
        path: path.to_path_buf(),
    })?;
    let mut mapping: Mapping =
        serde_yaml::from_str(yaml).map_err(|e| StoreError::InvalidFrontmatter {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let out = edit(&mut mapping);
    let yaml = serde_yaml::to_string(&mapping).map_err(|e| StoreError::Serialize(e.to_string()))?;
    write_atomic(path, &frontmatter::render(&yaml, body))?;
    Ok(out)
}

/// Set a single frontmatter field to a string value.
pub fn update_field(path: &Path, key: &str, value: &str) -> Result<(), StoreError> {
    edit_mapping(path, |mapping| {
        mapping.insert(
            Value::String(key.to_string()),
            Value::String(value.to_string()),
        );
    })
}

/// Set `status` and bump `updated` to now.
pub fn set_status(path: &Path, status: RequestStatus) -> Result<(), StoreError> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    edit_mapping(path, |mapping| {
        mapping.insert(
            Value::String("status".to_string()),
            Value::String(status.to_string()),
        );
        mapping.insert(Value::String("updated".to_string()), Value::String(now));
    })
}

/// Increment `attempts` (absent counts as 0) and return the new value.
pub fn increment_attempts(path: &Path) -> Result<u32, StoreError> {
    edit_mapping(path, |mapping| {
        let key = Value::String("attempts".to_string());
        let current = mapping.get(&key).and_then(Value::as_u64).unwrap_or(0) as u32;
        let next = current + 1;
        mapping.insert(key, Value::Number(next.into()));
        next
    })
}

/// Move a request into the archive, creating the directory if missing.
///
/// Returns the new path.
pub fn archive(path: &Path, layout: &HubLayout) -> Result<PathBuf, StoreError> {
    let archive_dir = layout.archive_dir();
    fs::create_dir_all(&archive_dir)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::MissingFrontmatter {
            path: path.to_path_buf(),
        })?;
    let target = archive_dir.join(file_name);
    fs::rename(path, &target)?;
    Ok(target)
}

/// Append a `## Result` section with a fenced block containing `text`.
pub fn append_result(path: &Path, text: &str) -> Result<(), StoreError> {
    let mut doc = fs::read_to_string(path)?;
    if !doc.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str("\n## Result\n\n```\n");
    doc.push_str(text.trim_end());
    doc.push_str("\n```\n");
    write_atomic(path, &doc)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;

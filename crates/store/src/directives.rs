// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directive file persistence.

use crate::codec::write_atomic;
use crate::frontmatter;
use crate::layout::HubLayout;
use crate::StoreError;
use accord_core::{Directive, DirectiveHeader, DirectiveId};
use std::fs;
use std::path::{Path, PathBuf};

/// Canonical path for a directive id.
pub fn directive_path(layout: &HubLayout, id: &DirectiveId) -> PathBuf {
    layout.directives_dir().join(format!("{id}.md"))
}

/// Parse a directive file.
pub fn parse_directive(path: &Path) -> Result<Directive, StoreError> {
    let text = fs::read_to_string(path)?;
    let (yaml, body) = frontmatter::split(&text).ok_or_else(|| StoreError::MissingFrontmatter {
        path: path.to_path_buf(),
    })?;
    let header: DirectiveHeader =
        serde_yaml::from_str(yaml).map_err(|e| StoreError::InvalidFrontmatter {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(Directive {
        header,
        body: body.to_string(),
        path: path.to_path_buf(),
    })
}

/// Write a directive back to its path, preserving the body.
pub fn write_directive(directive: &Directive) -> Result<(), StoreError> {
    let yaml = serde_yaml::to_string(&directive.header)
        .map_err(|e| StoreError::Serialize(e.to_string()))?;
    write_atomic(&directive.path, &frontmatter::render(&yaml, &directive.body))
}

#[cfg(test)]
#[path = "directives_tests.rs"]
mod tests;

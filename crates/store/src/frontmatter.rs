// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frontmatter splitting and rendering.
//!
//! The body is carried verbatim; only the YAML block between the `---`
//! fences is interpreted.

/// Split a document into `(yaml, body)`.
///
/// Returns `None` when the document does not open with a frontmatter fence
/// or the closing fence is missing.
pub fn split(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---\n")?;
    if let Some(idx) = rest.find("\n---\n") {
        let yaml = &rest[..idx];
        let body = &rest[idx + 5..];
        Some((yaml, body))
    } else {
        // Closing fence at end-of-file without a trailing newline
        rest.strip_suffix("\n---").map(|yaml| (yaml, ""))
    }
}

/// Render a document from a YAML block and a body.
pub fn render(yaml: &str, body: &str) -> String {
    let yaml = yaml.trim_end_matches('\n');
    if body.is_empty() {
        format!("---\n{yaml}\n---\n")
    } else {
        format!("---\n{yaml}\n---\n{body}")
    }
}

#[cfg(test)]
#[path = "frontmatter_tests.rs"]
mod tests;

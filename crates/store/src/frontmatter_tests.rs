// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn splits_yaml_and_body() {
    let doc = "---\nid: req-1\nstatus: pending\n---\n\n# Task\n\nDo it.\n";
    let (yaml, body) = split(doc).unwrap();
    assert_eq!(yaml, "id: req-1\nstatus: pending");
    assert_eq!(body, "\n# Task\n\nDo it.\n");
}

#[test]
fn splits_with_fence_at_eof() {
    let doc = "---\nid: req-1\n---";
    let (yaml, body) = split(doc).unwrap();
    assert_eq!(yaml, "id: req-1");
    assert_eq!(body, "");
}

#[yare::parameterized(
    no_open_fence   = { "id: req-1\n---\n" },
    no_close_fence  = { "---\nid: req-1\n" },
    empty           = { "" },
    plain_markdown  = { "# Title\n\nBody.\n" },
)]
fn rejects_documents_without_frontmatter(doc: &str) {
    assert!(split(doc).is_none());
}

#[test]
fn render_round_trips() {
    let doc = "---\nid: req-1\n---\nBody line.\n";
    let (yaml, body) = split(doc).unwrap();
    assert_eq!(render(yaml, body), doc);
}

#[test]
fn render_empty_body_keeps_fence_terminated() {
    assert_eq!(render("id: req-1", ""), "---\nid: req-1\n---\n");
}

#[test]
fn body_with_dashes_is_preserved() {
    let doc = "---\nid: req-1\n---\ntext\n---\nmore\n";
    let (_, body) = split(doc).unwrap();
    assert_eq!(body, "text\n---\nmore\n");
}

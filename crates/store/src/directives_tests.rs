// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use accord_core::test_support::DirectiveBuilder;
use accord_core::DirectivePhase;
use tempfile::TempDir;

fn hub() -> (TempDir, HubLayout) {
    let tmp = tempfile::tempdir().unwrap();
    let layout = HubLayout::new(tmp.path());
    layout.ensure_dirs().unwrap();
    (tmp, layout)
}

#[test]
fn directive_round_trips() {
    let (_tmp, layout) = hub();
    let mut directive = DirectiveBuilder::new("dir-1", DirectivePhase::Negotiating)
        .requests(&["cp1", "r1"])
        .contract_proposals(&["cp1"])
        .build();
    directive.path = directive_path(&layout, directive.id());
    directive.body = "\n## Plan\n\nShip it.\n".to_string();

    write_directive(&directive).unwrap();
    let parsed = parse_directive(&directive.path).unwrap();

    assert_eq!(parsed.header, directive.header);
    assert_eq!(parsed.body, directive.body);
}

#[test]
fn rewrite_preserves_body_and_unknown_keys() {
    let (_tmp, layout) = hub();
    let path = directive_path(&layout, &"dir-2".into());
    std::fs::write(
        &path,
        "---\nid: dir-2\nstatus: planning\nsponsor: infra\n---\nBody text.\n",
    )
    .unwrap();

    let mut directive = parse_directive(&path).unwrap();
    directive.header.status = DirectivePhase::Implementing;
    write_directive(&directive).unwrap();

    let reparsed = parse_directive(&path).unwrap();
    assert_eq!(reparsed.phase(), DirectivePhase::Implementing);
    assert_eq!(reparsed.body, "Body text.\n");
    assert_eq!(
        reparsed.header.extra.get("sponsor").and_then(|v| v.as_str()),
        Some("infra")
    );
}

#[test]
fn parse_rejects_unknown_phase() {
    let (_tmp, layout) = hub();
    let path = directive_path(&layout, &"dir-3".into());
    std::fs::write(&path, "---\nid: dir-3\nstatus: reviewing\n---\n").unwrap();
    assert!(matches!(
        parse_directive(&path),
        Err(StoreError::InvalidFrontmatter { .. })
    ));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt assembly for agent invocations.

use accord_core::Request;
use accord_store::HubLayout;
use std::path::Path;

/// Instructions appended to every agent prompt.
const STANDARD_INSTRUCTIONS: &str = "\
## Instructions

- Work in the current directory; it is the working tree for this service.
- Carry out the request above completely before finishing.
- Keep changes scoped to this request. Do not modify other services' files.
- If the request references a contract, honor its interface exactly.
- Summarize what you did at the end of your reply.";

fn push_section(prompt: &mut String, title: &str, content: &str) {
    prompt.push_str("\n## ");
    prompt.push_str(title);
    prompt.push_str("\n\n");
    prompt.push_str(content.trim_end());
    prompt.push('\n');
}

fn push_file_section(prompt: &mut String, title: &str, path: &Path, fence: &str) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    prompt.push_str("\n## ");
    prompt.push_str(title);
    prompt.push_str("\n\n```");
    prompt.push_str(fence);
    prompt.push('\n');
    prompt.push_str(content.trim_end());
    prompt.push_str("\n```\n");
}

/// Locate a contract by name: `contracts/{name}` first, then
/// `contracts/internal/{name}`, trying `.yaml` and `.md` suffixes when the
/// name has no extension.
fn find_contract(layout: &HubLayout, name: &str) -> Option<std::path::PathBuf> {
    let contracts = layout.contracts_dir();
    let mut candidates = Vec::new();
    if name.contains('.') {
        candidates.push(contracts.join(name));
        candidates.push(contracts.join("internal").join(name));
    } else {
        for ext in ["yaml", "md"] {
            candidates.push(contracts.join(format!("{name}.{ext}")));
            candidates.push(contracts.join("internal").join(format!("{name}.{ext}")));
        }
    }
    candidates.into_iter().find(|path| path.exists())
}

/// Build the full invocation prompt for a request.
///
/// Layers, in order: the request body, its frontmatter fields, the
/// service's registry entry, the related contract, the skill index, the
/// last failure checkpoint, and the standard instructions.
pub fn build_prompt(request: &Request, layout: &HubLayout, checkpoint: Option<&str>) -> String {
    let mut prompt = format!("# Request {}\n\n{}\n", request.id(), request.body.trim());

    let header = &request.header;
    let mut fields = vec![
        format!("- from: {}", header.from),
        format!("- to: {}", header.to),
        format!("- scope: {}", header.scope),
        format!("- type: {}", header.kind),
        format!("- priority: {}", header.priority),
        format!("- attempts: {}", header.attempts),
    ];
    if let Some(directive) = &header.directive {
        fields.push(format!("- directive: {directive}"));
    }
    if let Some(contract) = &header.related_contract {
        fields.push(format!("- related_contract: {contract}"));
    }
    push_section(&mut prompt, "Request metadata", &fields.join("\n"));

    push_file_section(
        &mut prompt,
        &format!("Service registry: {}", request.service),
        &layout.registry_file(&request.service),
        "yaml",
    );

    if let Some(contract) = &header.related_contract {
        if let Some(path) = find_contract(layout, contract) {
            push_file_section(&mut prompt, &format!("Contract: {contract}"), &path, "");
        }
    }

    push_file_section(&mut prompt, "Available skills", &layout.skills_index(), "");

    if let Some(checkpoint) = checkpoint {
        push_section(&mut prompt, "Previous attempt", checkpoint);
    }

    prompt.push('\n');
    prompt.push_str(STANDARD_INSTRUCTIONS);
    prompt.push('\n');
    prompt
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;

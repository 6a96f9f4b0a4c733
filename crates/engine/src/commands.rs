// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command fast-path diagnostics.
//!
//! Requests with `type: command` never reach an agent; the worker runs one
//! of these pure filesystem inspections and archives the request with the
//! report appended.

use accord_core::{HubConfig, Request, RequestStatus};
use accord_store::{scan_archive, scan_inboxes, HistoryLog, HubLayout};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Commands the fast-path recognizes.
pub const KNOWN_COMMANDS: [&str; 4] = ["status", "scan", "check-inbox", "validate"];

/// Outcome of a diagnostic command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub report: String,
}

impl CommandOutput {
    fn ok(report: String) -> Self {
        Self {
            success: true,
            report,
        }
    }

    fn failed(report: String) -> Self {
        Self {
            success: false,
            report,
        }
    }
}

/// Run the diagnostic named by the request's `command` field.
///
/// An unknown or missing command still produces a report; only `success`
/// differs.
pub fn run_command(request: &Request, layout: &HubLayout, config: &HubConfig) -> CommandOutput {
    match request.header.command.as_deref() {
        Some("status") => CommandOutput::ok(status_report(layout, config)),
        Some("scan") => CommandOutput::ok(scan_report(layout)),
        Some("check-inbox") => CommandOutput::ok(check_inbox_report(layout, &request.service)),
        Some("validate") => validate_report(
            layout,
            config,
            request.header.command_args.as_deref(),
        ),
        Some(other) => CommandOutput::failed(format!("unknown command: {other}")),
        None => CommandOutput::failed("request has type: command but no command field".to_string()),
    }
}

fn status_report(layout: &HubLayout, config: &HubConfig) -> String {
    let inbox = scan_inboxes(layout);
    let archived = scan_archive(layout);

    let mut per_service: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for request in &inbox {
        let entry = per_service.entry(request.service.as_str()).or_default();
        match request.status() {
            RequestStatus::Pending => entry.0 += 1,
            RequestStatus::InProgress => entry.1 += 1,
            _ => {}
        }
    }

    let mut report = format!(
        "hub status for project '{}'\n\n{} request(s) in inboxes, {} archived\n",
        config.project.name,
        inbox.len(),
        archived.len()
    );
    for service in config.service_names() {
        let (pending, in_progress) = per_service.get(service).copied().unwrap_or_default();
        let _ = writeln!(
            report,
            "  {service}: {pending} pending, {in_progress} in progress"
        );
    }
    // Inboxes that exist on disk but are not configured
    for (service, (pending, in_progress)) in &per_service {
        if !config.service_names().contains(service) {
            let _ = writeln!(
                report,
                "  {service} (unconfigured): {pending} pending, {in_progress} in progress"
            );
        }
    }

    // Today's history gives a quick activity pulse per service
    let history = HistoryLog::new(layout.history_dir());
    let today = chrono::Utc::now().date_naive();
    let mut activity = Vec::new();
    for service in config.service_names() {
        match history.read_day(today, service) {
            Ok(entries) if !entries.is_empty() => {
                activity.push(format!("  {service}: {} transition(s)", entries.len()));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(service, error = %e, "could not read history"),
        }
    }
    if !activity.is_empty() {
        let _ = writeln!(report, "
activity today:");
        for line in activity {
            let _ = writeln!(report, "{line}");
        }
    }
    report
}

fn scan_report(layout: &HubLayout) -> String {
    let inbox = scan_inboxes(layout);
    if inbox.is_empty() {
        return "no requests in any inbox\n".to_string();
    }
    let mut report = format!("{} request(s) found\n", inbox.len());
    for request in &inbox {
        let _ = writeln!(
            report,
            "  {} -> {} [{} {}]",
            request.id(),
            request.service,
            request.status(),
            request.priority()
        );
    }
    report
}

fn check_inbox_report(layout: &HubLayout, service: &str) -> String {
    let inbox = scan_inboxes(layout);
    let mine: Vec<_> = inbox
        .iter()
        .filter(|r| r.service == service && r.status() == RequestStatus::Pending)
        .collect();
    if mine.is_empty() {
        return format!("inbox for {service} is empty\n");
    }
    let mut report = format!("{} pending request(s) for {service}\n", mine.len());
    for request in mine {
        let _ = writeln!(report, "  {} [{}]", request.id(), request.priority());
    }
    report
}

fn validate_report(
    layout: &HubLayout,
    config: &HubConfig,
    service_arg: Option<&str>,
) -> CommandOutput {
    let mut problems = Vec::new();

    for (name, dir) in [
        ("inbox", layout.inbox_root()),
        ("archive", layout.archive_dir()),
        ("history", layout.history_dir()),
        ("directives", layout.directives_dir()),
    ] {
        if !dir.is_dir() {
            problems.push(format!("missing {name} directory: {}", dir.display()));
        }
    }

    let services: Vec<&str> = match service_arg {
        Some(name) => {
            if config.service(name).is_none() {
                problems.push(format!("service not configured: {name}"));
            }
            vec![name]
        }
        None => config.service_names(),
    };
    for service in services {
        if !layout.service_inbox(service).is_dir() {
            problems.push(format!("service {service} has no inbox directory"));
        }
        if !layout.registry_file(service).is_file() {
            problems.push(format!("service {service} has no registry entry"));
        }
    }

    if problems.is_empty() {
        CommandOutput::ok("hub layout is valid\n".to_string())
    } else {
        let mut report = format!("{} problem(s) found\n", problems.len());
        for problem in &problems {
            let _ = writeln!(report, "  {problem}");
        }
        CommandOutput::failed(report)
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

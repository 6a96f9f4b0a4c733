// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders shared by tests across crates.
#![allow(clippy::unwrap_used)]

use crate::directive::{Directive, DirectiveHeader, DirectivePhase};
use crate::request::{Priority, Request, RequestHeader, RequestStatus, COMMAND_TYPE};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Builder for request fixtures.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    header: RequestHeader,
    body: String,
}

impl RequestBuilder {
    pub fn new(id: impl Into<String>, to: impl Into<String>) -> Self {
        let to = to.into();
        let mut header = RequestHeader::new(id.into(), to);
        header.from = "orchestrator".to_string();
        Self {
            header,
            body: "Do the work.".to_string(),
        }
    }

    pub fn from_service(mut self, from: impl Into<String>) -> Self {
        self.header.from = from.into();
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.header.kind = kind.into();
        self
    }

    /// Switch the request onto the command fast-path.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.header.kind = COMMAND_TYPE.to_string();
        self.header.command = Some(command.into());
        self
    }

    pub fn command_args(mut self, args: impl Into<String>) -> Self {
        self.header.command_args = Some(args.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.header.priority = priority;
        self
    }

    pub fn status(mut self, status: RequestStatus) -> Self {
        self.header.status = status;
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.header.attempts = attempts;
        self
    }

    pub fn directive(mut self, id: impl Into<String>) -> Self {
        self.header.directive = Some(id.into().into());
        self
    }

    pub fn related_contract(mut self, contract: impl Into<String>) -> Self {
        self.header.related_contract = Some(contract.into());
        self
    }

    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.header.depends_on_requests = ids.iter().map(|id| (*id).into()).collect();
        self
    }

    pub fn created_ms(mut self, epoch_ms: i64) -> Self {
        self.header.created = DateTime::<Utc>::from_timestamp_millis(epoch_ms);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        let service = self.header.to.clone();
        Request {
            header: self.header,
            body: self.body,
            path: PathBuf::new(),
            service,
        }
    }
}

/// Builder for directive fixtures.
#[derive(Debug, Clone)]
pub struct DirectiveBuilder {
    header: DirectiveHeader,
    body: String,
}

impl DirectiveBuilder {
    pub fn new(id: impl Into<String>, phase: DirectivePhase) -> Self {
        let mut header = DirectiveHeader::new(id.into(), phase);
        header.title = "Test directive".to_string();
        Self {
            header,
            body: String::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.header.title = title.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.header.priority = priority;
        self
    }

    pub fn requests(mut self, ids: &[&str]) -> Self {
        self.header.requests = ids.iter().map(|id| (*id).into()).collect();
        self
    }

    pub fn contract_proposals(mut self, ids: &[&str]) -> Self {
        self.header.contract_proposals = ids.iter().map(|id| (*id).into()).collect();
        self
    }

    pub fn test_requests(mut self, ids: &[&str]) -> Self {
        self.header.test_requests = ids.iter().map(|id| (*id).into()).collect();
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.header.retry_count = count;
        self
    }

    pub fn max_retries(mut self, max: u32) -> Self {
        self.header.max_retries = max;
        self
    }

    pub fn build(self) -> Directive {
        Directive {
            header: self.header,
            body: self.body,
            path: PathBuf::new(),
        }
    }
}

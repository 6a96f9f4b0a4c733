// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! accord-daemon: process wrapper around the Accord engine.
//!
//! Owns what the engine deliberately does not: config discovery, the
//! process lock, tracing setup, signal-driven shutdown, and the JSON
//! bridge for external event consumers.

pub mod bridge;
pub mod lifecycle;
pub mod services;

pub use bridge::{attach_json_bridge, EventFrame};
pub use lifecycle::{Daemon, LifecycleError};
pub use services::attach_service_watcher;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted session map (`.agent-sessions.json`).

use crate::codec::write_atomic;
use crate::StoreError;
use accord_core::SessionRecord;
use std::collections::HashMap;
use std::path::Path;

/// Load the service -> session map. An absent file is an empty map.
pub fn load_sessions(path: &Path) -> Result<HashMap<String, SessionRecord>, StoreError> {
    let text = match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
        Ok(text) => text,
    };
    serde_json::from_str(&text).map_err(|e| StoreError::InvalidJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Save the session map atomically.
pub fn save_sessions(
    path: &Path,
    sessions: &HashMap<String, SessionRecord>,
) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(sessions)
        .map_err(|e| StoreError::Serialize(e.to_string()))?;
    write_atomic(path, &json)
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;

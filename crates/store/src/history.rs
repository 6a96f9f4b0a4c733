// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSONL history log.
//!
//! One file per day per actor: `YYYY-MM-DD-{actor}.jsonl`. Lines are never
//! rewritten or removed.

use crate::StoreError;
use accord_core::HistoryEntry;
use chrono::NaiveDate;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct HistoryLog {
    dir: PathBuf,
}

impl HistoryLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, date: NaiveDate, actor: &str) -> PathBuf {
        self.dir
            .join(format!("{}-{actor}.jsonl", date.format("%Y-%m-%d")))
    }

    /// Append one record to the day file for its actor.
    pub fn append(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let line =
            serde_json::to_string(entry).map_err(|e| StoreError::Serialize(e.to_string()))?;
        let path = self.path_for(entry.ts.date_naive(), &entry.actor);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read one actor's records for a day. Absent file means no records.
    ///
    /// Unreadable lines are logged and skipped so one torn write cannot
    /// hide a whole day of history.
    pub fn read_day(&self, date: NaiveDate, actor: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let path = self.path_for(date, actor);
        let text = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
            Ok(text) => text,
        };
        let mut entries = Vec::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping bad history line")
                }
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;

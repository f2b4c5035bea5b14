// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Run history persistence
//!
//! The history records which change identifiers already produced a note and
//! when the last successful run happened. It is a single JSON document
//! loaded at the start of a run and replaced wholesale at the end.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// File name of the history document inside the content repository
pub const HISTORY_FILE_NAME: &str = ".note-history.json";

/// History store errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history file could not be read or written
    #[error("History file {path}: {source}")]
    Io {
        /// Path of the history file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The history file is not valid JSON of the expected shape
    #[error("History file {path} is malformed: {source}")]
    Malformed {
        /// Path of the history file
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

/// Processed change identifiers and the time of the last successful run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunHistory {
    /// Timestamp of the most recent successful run
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    /// Change identifiers in processing order, without duplicates
    #[serde(default)]
    pub processed_commits: Vec<String>,
}

impl RunHistory {
    /// Check whether `change_id` already produced a note
    #[must_use]
    pub fn contains(&self, change_id: &str) -> bool {
        self.processed_commits.iter().any(|id| id == change_id)
    }

    /// Record a successful run for `change_id` at `now`
    ///
    /// The identifier is appended only if absent; `last_run` is always updated.
    pub fn record(&mut self, change_id: &str, now: DateTime<Utc>) {
        if !self.contains(change_id) {
            self.processed_commits.push(change_id.to_string());
        }
        self.last_run = Some(now);
    }
}

/// JSON-file backed history persistence
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Create a store for the given history file
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the default location inside `content_root`
    #[must_use]
    pub fn in_content_root(content_root: &Path) -> Self {
        Self::new(content_root.join(HISTORY_FILE_NAME))
    }

    /// Path of the history file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history, returning an empty one if the file does not exist
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<RunHistory, HistoryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no history file, starting fresh");
                return Ok(RunHistory::default());
            }
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut history: RunHistory =
            serde_json::from_str(&content).map_err(|source| HistoryError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        dedup_preserving_order(&mut history.processed_commits);
        Ok(history)
    }

    /// Replace the persisted history with `history`
    ///
    /// The document is written to a temporary file next to the target and
    /// renamed over it.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Io` if the file cannot be written.
    pub fn save(&self, history: &RunHistory) -> Result<(), HistoryError> {
        let io_err = |source: io::Error| HistoryError::Io {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(history).map_err(|source| {
            HistoryError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(io_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|err| io_err(err.error))?;

        debug!(
            path = %self.path.display(),
            processed = history.processed_commits.len(),
            "history saved"
        );
        Ok(())
    }
}

fn dedup_preserving_order(ids: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::in_content_root(dir.path());
        let history = store.load().expect("load");
        assert!(history.processed_commits.is_empty());
        assert!(history.last_run.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::in_content_root(dir.path());
        let mut history = RunHistory::default();
        history.record("abc1234", at(10, 0));
        history.record("def5678", at(11, 30));

        store.save(&history).expect("save");
        assert_eq!(store.load().expect("load"), history);
    }

    #[test]
    fn test_save_overwrites_previous_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::in_content_root(dir.path());
        let mut history = RunHistory::default();
        history.record("abc1234", at(10, 0));
        store.save(&history).expect("first save");

        history.record("def5678", at(12, 0));
        store.save(&history).expect("second save");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.processed_commits, vec!["abc1234", "def5678"]);
        assert_eq!(loaded.last_run, Some(at(12, 0)));
    }

    #[test]
    fn test_json_layout_uses_camel_case_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::in_content_root(dir.path());
        let mut history = RunHistory::default();
        history.record("abc1234", at(9, 15));
        store.save(&history).expect("save");

        let raw = fs::read_to_string(store.path()).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["processedCommits"][0], "abc1234");
        assert!(value["lastRun"].as_str().expect("timestamp").starts_with("2026-03-01T09:15:00"));
    }

    #[test]
    fn test_load_accepts_null_last_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::in_content_root(dir.path());
        fs::write(store.path(), r#"{"lastRun":null,"processedCommits":[]}"#).expect("write");
        assert_eq!(store.load().expect("load"), RunHistory::default());
    }

    #[test]
    fn test_load_accepts_millisecond_timestamps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::in_content_root(dir.path());
        fs::write(
            store.path(),
            r#"{"lastRun":"2026-03-01T09:15:42.123Z","processedCommits":["abc1234"]}"#,
        )
        .expect("write");
        let history = store.load().expect("load");
        assert!(history.contains("abc1234"));
        assert!(history.last_run.is_some());
    }

    #[test]
    fn test_load_drops_duplicate_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::in_content_root(dir.path());
        fs::write(
            store.path(),
            r#"{"lastRun":null,"processedCommits":["a","b","a"]}"#,
        )
        .expect("write");
        assert_eq!(store.load().expect("load").processed_commits, vec!["a", "b"]);
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::in_content_root(dir.path());
        fs::write(store.path(), "not json").expect("write");
        assert!(matches!(store.load(), Err(HistoryError::Malformed { .. })));
    }

    #[test]
    fn test_record_never_duplicates() {
        let mut history = RunHistory::default();
        history.record("abc1234", at(10, 0));
        history.record("abc1234", at(10, 30));
        assert_eq!(history.processed_commits, vec!["abc1234"]);
        assert_eq!(history.last_run, Some(at(10, 30)));
    }
}

//! Change window types
//!
//! A [`ChangeWindow`] is the unit of analysis for one pipeline run: the last
//! N commits of a repository reduced to their log, diff statistics and a
//! bounded slice of the literal diff.

use serde::{Deserialize, Serialize};

/// Maximum number of characters of diff text carried in a window
pub const MAX_DIFF_CHARS: usize = 4000;

/// Length of the short change identifier
pub const SHORT_ID_LEN: usize = 7;

/// Represents file changes in a commit window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Path to the file
    pub path: String,
    /// Change status: "added", "modified", "deleted", "renamed"
    pub status: String,
    /// Number of lines added
    pub insertions: usize,
    /// Number of lines deleted
    pub deletions: usize,
}

/// Summary of all changes in a commit window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Number of files changed
    pub files_changed: usize,
    /// Total lines added
    pub insertions: usize,
    /// Total lines deleted
    pub deletions: usize,
    /// Per-file changes
    pub files: Vec<FileDiff>,
}

impl DiffSummary {
    /// Create an empty diff summary
    #[must_use]
    pub fn empty() -> Self {
        Self {
            files_changed: 0,
            insertions: 0,
            deletions: 0,
            files: Vec::new(),
        }
    }

    /// Check whether the summary records no changes at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.files_changed == 0
    }

    /// Render the summary in a `git diff --stat` like layout
    ///
    /// One ` <path> | +<ins> -<del>` line per file followed by a totals line.
    /// An empty summary renders as an empty string.
    #[must_use]
    pub fn stat_text(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        for file in &self.files {
            out.push_str(&format!(
                " {} | +{} -{}\n",
                file.path, file.insertions, file.deletions
            ));
        }
        out.push_str(&format!(
            " {} file{} changed, {} insertion{}(+), {} deletion{}(-)",
            self.files_changed,
            plural(self.files_changed),
            self.insertions,
            plural(self.insertions),
            self.deletions,
            plural(self.deletions),
        ));
        out
    }
}

impl Default for DiffSummary {
    fn default() -> Self {
        Self::empty()
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// The bundle of commit log, diff and statistics analyzed in one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeWindow {
    /// Display name of the source repository
    pub repo_name: String,
    /// Current branch name (`HEAD` when detached)
    pub branch: String,
    /// Short identifier of the head commit
    pub change_id: String,
    /// One `<short-sha> <subject>` line per commit, newest first
    pub log: String,
    /// Per-file change statistics
    pub diff_stat: DiffSummary,
    /// Unified diff text, truncated to [`MAX_DIFF_CHARS`]
    pub diff: String,
}

impl ChangeWindow {
    /// The file statistics rendered as text
    #[must_use]
    pub fn stat_text(&self) -> String {
        self.diff_stat.stat_text()
    }

    /// First line of the commit log
    #[must_use]
    pub fn headline(&self) -> &str {
        self.log.lines().next().unwrap_or("")
    }
}

/// Shorten a full object id to the change identifier length
#[must_use]
pub fn short_id(sha: &str) -> &str {
    match sha.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}

/// Keep at most `max` characters of `text`, respecting char boundaries
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Repository inspection
//!
//! This module reads the most recent commits of a repository into a
//! [`ChangeWindow`] using the `git2` crate. Once the repository is open,
//! every field is extracted independently: a failing lookup degrades that
//! field to an empty value instead of aborting the inspection.

use crate::error::GitError;
use crate::window::{ChangeWindow, DiffSummary, FileDiff, MAX_DIFF_CHARS, short_id, truncate_chars};
use git2::{Diff, DiffFormat, DiffOptions, Patch, Repository, Sort, Tree};
use std::path::Path;
use tracing::{debug, warn};

/// A git repository wrapper for reading change windows
pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    /// Open a git repository at the given path
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if the path is not a git repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|_| GitError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self { repo })
    }

    /// Discover and open a git repository containing the given path
    ///
    /// This walks up the directory tree to find a `.git` directory.
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if no repository is found.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|_| GitError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self { repo })
    }

    /// Get the working directory path (None for bare repos)
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    pub(crate) fn raw(&self) -> &Repository {
        &self.repo
    }

    /// Get the HEAD commit SHA
    ///
    /// # Errors
    ///
    /// Returns `GitError` if HEAD cannot be resolved.
    pub fn head_sha(&self) -> Result<String, GitError> {
        let head = self.repo.head()?;
        let oid = head.target().ok_or_else(|| GitError::InvalidReference {
            reference: "HEAD".to_string(),
        })?;
        Ok(oid.to_string())
    }

    /// Get the short name of the current branch, or `HEAD` when detached
    ///
    /// # Errors
    ///
    /// Returns `GitError` if HEAD cannot be resolved (for example an unborn branch).
    pub fn branch(&self) -> Result<String, GitError> {
        if self.repo.head_detached()? {
            return Ok("HEAD".to_string());
        }
        let head = self.repo.head()?;
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }

    /// One `<short-sha> <subject>` line per commit for the latest `commits` commits
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the history cannot be walked.
    pub fn commit_log(&self, commits: usize) -> Result<String, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
        revwalk.push_head()?;

        let mut lines = Vec::with_capacity(commits);
        for oid_result in revwalk.take(commits) {
            let git_commit = self.repo.find_commit(oid_result?)?;
            let sha = git_commit.id().to_string();
            lines.push(format!(
                "{} {}",
                short_id(&sha),
                git_commit.summary().unwrap_or("")
            ));
        }

        Ok(lines.join("\n"))
    }

    /// Per-file statistics for `HEAD~commits..HEAD`
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the diff cannot be computed.
    pub fn diff_summary(&self, commits: usize) -> Result<DiffSummary, GitError> {
        let diff = self.window_diff(commits)?;
        let stats = diff.stats()?;
        let mut files = Vec::new();

        for (idx, delta) in diff.deltas().enumerate() {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unknown>".to_string());

            let status = match delta.status() {
                git2::Delta::Added => "added",
                git2::Delta::Deleted => "deleted",
                git2::Delta::Modified => "modified",
                git2::Delta::Renamed => "renamed",
                git2::Delta::Copied => "copied",
                _ => "unknown",
            }
            .to_string();

            // Binary deltas have no patch and count as zero lines
            let (insertions, deletions) = match Patch::from_diff(&diff, idx)? {
                Some(patch) => {
                    let (_, added, removed) = patch.line_stats()?;
                    (added, removed)
                }
                None => (0, 0),
            };

            files.push(FileDiff {
                path,
                status,
                insertions,
                deletions,
            });
        }

        Ok(DiffSummary {
            files_changed: stats.files_changed(),
            insertions: stats.insertions(),
            deletions: stats.deletions(),
            files,
        })
    }

    /// Unified patch text for `HEAD~commits..HEAD`, cut to `max_chars`
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the diff cannot be computed or printed.
    pub fn diff_text(&self, commits: usize, max_chars: usize) -> Result<String, GitError> {
        let diff = self.window_diff(commits)?;
        // A char is at most 4 bytes, so this many bytes always covers max_chars
        let byte_budget = max_chars.saturating_mul(4);
        let mut text = String::new();

        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if text.len() < byte_budget {
                if matches!(line.origin(), '+' | '-' | ' ') {
                    text.push(line.origin());
                }
                text.push_str(&String::from_utf8_lossy(line.content()));
            }
            true
        })?;

        Ok(truncate_chars(&text, max_chars))
    }

    fn window_diff(&self, commits: usize) -> Result<Diff<'_>, GitError> {
        let head_tree = self.repo.head()?.peel_to_tree()?;
        let base_tree = self.base_tree(commits)?;

        let mut opts = DiffOptions::new();
        opts.ignore_whitespace(false);

        Ok(self
            .repo
            .diff_tree_to_tree(base_tree.as_ref(), Some(&head_tree), Some(&mut opts))?)
    }

    /// Tree of `HEAD~commits` following first parents, or `None` past the root
    fn base_tree(&self, commits: usize) -> Result<Option<Tree<'_>>, GitError> {
        let mut commit = self.repo.head()?.peel_to_commit()?;
        for _ in 0..commits {
            if commit.parent_count() == 0 {
                debug!("commit window reaches past the root, diffing against the empty tree");
                return Ok(None);
            }
            commit = commit.parent(0)?;
        }
        Ok(Some(commit.tree()?))
    }
}

/// Inspect the latest `commits` commits of the repository at `path`
///
/// # Errors
///
/// Returns `GitError::InvalidWindow` when `commits` is zero and
/// `GitError::RepositoryNotFound` when no repository contains `path`.
/// Every other failure degrades the affected field to an empty value.
pub fn inspect(path: impl AsRef<Path>, commits: usize) -> Result<ChangeWindow, GitError> {
    if commits == 0 {
        return Err(GitError::InvalidWindow { commits });
    }

    let path = path.as_ref();
    let repo = GitRepo::discover(path)?;

    let change_id = degrade(
        "change_id",
        repo.head_sha().map(|sha| short_id(&sha).to_string()),
    );
    let branch = degrade("branch", repo.branch());
    let log = degrade("log", repo.commit_log(commits));
    let diff_stat = degrade("diff_stat", repo.diff_summary(commits));
    let diff = degrade("diff", repo.diff_text(commits, MAX_DIFF_CHARS));

    Ok(ChangeWindow {
        repo_name: repo_display_name(repo.workdir().unwrap_or(path)),
        branch,
        change_id,
        log,
        diff_stat,
        diff,
    })
}

fn degrade<T: Default>(field: &'static str, result: Result<T, GitError>) -> T {
    result.unwrap_or_else(|err| {
        warn!(field, error = %err, "git inspection failed, using empty value");
        T::default()
    })
}

/// Final path component of the canonicalized working directory
fn repo_display_name(path: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| resolved.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use similar_asserts::assert_eq;
    use std::fs;

    fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> git2::Oid {
        let workdir = repo.workdir().expect("workdir");
        let file_path = workdir.join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(&file_path, content).expect("write file");

        let mut index = repo.index().expect("index");
        index.add_path(Path::new(name)).expect("add path");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = repo.find_tree(tree_id).expect("find tree");
        let sig = Signature::now("Test Author", "test@example.com").expect("signature");

        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().expect("head commit")],
            Err(_) => vec![],
        };
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .expect("commit")
    }

    #[test]
    fn test_open_nonexistent_repository() {
        let result = GitRepo::open("/nonexistent/path");
        match result {
            Err(GitError::RepositoryNotFound { path }) => {
                assert!(path.contains("nonexistent"));
            }
            _ => panic!("Expected RepositoryNotFound error"),
        }
    }

    #[test]
    fn test_inspect_rejects_zero_window() {
        let result = inspect(".", 0);
        assert!(matches!(result, Err(GitError::InvalidWindow { commits: 0 })));
    }

    #[test]
    fn test_single_commit_diffs_against_empty_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = Repository::init(dir.path()).expect("init");
        commit_file(&repo, "src/main.rs", "fn main() {}\n", "initial commit");

        let git_repo = GitRepo::open(dir.path()).expect("open");
        let summary = git_repo.diff_summary(1).expect("summary");
        assert_eq!(summary.files_changed, 1);
        assert_eq!(summary.files[0].path, "src/main.rs");
        assert_eq!(summary.files[0].status, "added");
        assert_eq!(summary.files[0].insertions, 1);
    }

    #[test]
    fn test_diff_text_contains_patch_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = Repository::init(dir.path()).expect("init");
        commit_file(&repo, "a.txt", "one\n", "first");
        commit_file(&repo, "a.txt", "one\ntwo\n", "second");

        let git_repo = GitRepo::open(dir.path()).expect("open");
        let text = git_repo.diff_text(1, MAX_DIFF_CHARS).expect("diff");
        assert!(text.contains("+two"), "patch should include added line: {text}");
        assert!(text.contains(" one"), "patch should include context line: {text}");
        assert!(!text.contains("+one"));
    }

    #[test]
    fn test_diff_text_is_truncated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = Repository::init(dir.path()).expect("init");
        let big = "x".repeat(100) + "\n";
        commit_file(&repo, "big.txt", &big.repeat(200), "big file");

        let git_repo = GitRepo::open(dir.path()).expect("open");
        let text = git_repo.diff_text(1, 50).expect("diff");
        assert_eq!(text.chars().count(), 50);
    }

    #[test]
    fn test_commit_log_lines_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = Repository::init(dir.path()).expect("init");
        commit_file(&repo, "a.txt", "1\n", "first change");
        let second = commit_file(&repo, "a.txt", "2\n", "second change\n\nbody text");

        let git_repo = GitRepo::open(dir.path()).expect("open");
        let log = git_repo.commit_log(5).expect("log");
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            format!("{} second change", &second.to_string()[..7])
        );
        assert!(lines[1].ends_with("first change"));
    }

    #[test]
    fn test_unborn_repository_degrades_to_empty_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        Repository::init(dir.path()).expect("init");

        let window = inspect(dir.path(), 1).expect("inspect should not fail");
        assert_eq!(window.change_id, "");
        assert_eq!(window.log, "");
        assert_eq!(window.diff, "");
        assert!(window.diff_stat.is_empty());
    }

    #[test]
    fn test_repo_display_name_uses_last_component() {
        let dir = tempfile::tempdir().expect("tempdir");
        let named = dir.path().join("my-project");
        fs::create_dir_all(&named).expect("mkdir");
        assert_eq!(repo_display_name(&named), "my-project");
    }
}

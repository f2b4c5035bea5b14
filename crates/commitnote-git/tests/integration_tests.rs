//! Integration tests for commitnote-git
//!
//! These tests build throwaway repositories with `git2` and inspect them
//! through the public API.

use commitnote_git::{ChangeWindow, Committer, GitCommitter, GitError, MAX_DIFF_CHARS, inspect};
use git2::{Repository, Signature};
use similar_asserts::assert_eq;
use std::fs;
use std::path::Path;

/// Write `files` and commit them on top of HEAD
fn commit_files(repo: &Repository, files: &[(&str, &str)], message: &str) -> String {
    let workdir = repo.workdir().expect("workdir").to_path_buf();
    let mut index = repo.index().expect("index");
    for (name, content) in files {
        let path = workdir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(&path, content).expect("write file");
        index.add_path(Path::new(name)).expect("add path");
    }
    index.write().expect("write index");

    let tree = repo
        .find_tree(index.write_tree().expect("write tree"))
        .expect("find tree");
    let sig = Signature::now("Test Author", "test@example.com").expect("signature");
    let parent = repo.head().ok().map(|h| h.peel_to_commit().expect("head commit"));
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("commit")
        .to_string()
}

fn inspect_ok(path: &Path, commits: usize) -> ChangeWindow {
    inspect(path, commits).expect("inspection should succeed")
}

#[test]
fn test_inspect_single_commit_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = Repository::init(dir.path()).expect("init");
    commit_files(&repo, &[("README.md", "# demo\n")], "initial import");
    let head = commit_files(
        &repo,
        &[
            ("src/parser.rs", "pub fn parse() {}\n"),
            ("tests/parser_test.rs", "#[test]\nfn parses() {}\n"),
        ],
        "fix parser edge case",
    );

    let window = inspect_ok(dir.path(), 1);

    assert_eq!(window.change_id, &head[..7]);
    assert_eq!(window.log, format!("{} fix parser edge case", &head[..7]));
    assert_eq!(window.diff_stat.files_changed, 2);
    assert_eq!(window.diff_stat.insertions, 3);

    let stat = window.stat_text();
    assert!(stat.contains("src/parser.rs"));
    assert!(stat.contains("tests/parser_test.rs"));
    assert!(!stat.contains("README.md"), "older commits are outside the window");
    assert!(window.diff.contains("+pub fn parse() {}"));
}

#[test]
fn test_inspect_multi_commit_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = Repository::init(dir.path()).expect("init");
    commit_files(&repo, &[("a.txt", "a\n")], "add a");
    commit_files(&repo, &[("b.txt", "b\n")], "add b");
    commit_files(&repo, &[("c.txt", "c\n")], "add c");

    let window = inspect_ok(dir.path(), 2);

    assert_eq!(window.log.lines().count(), 2);
    let paths: Vec<&str> = window
        .diff_stat
        .files
        .iter()
        .map(|f| f.path.as_str())
        .collect();
    assert_eq!(paths, vec!["b.txt", "c.txt"]);
}

#[test]
fn test_inspect_window_larger_than_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = Repository::init(dir.path()).expect("init");
    commit_files(&repo, &[("only.txt", "x\n")], "only commit");

    let window = inspect_ok(dir.path(), 10);
    assert_eq!(window.log.lines().count(), 1);
    assert_eq!(window.diff_stat.files_changed, 1);
}

#[test]
fn test_inspect_branch_and_repo_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("sample-repo");
    fs::create_dir_all(&root).expect("mkdir");
    let repo = Repository::init(&root).expect("init");
    commit_files(&repo, &[("a.txt", "a\n")], "first");

    let head = repo.head().expect("head").peel_to_commit().expect("commit");
    repo.branch("feature/notes", &head, false).expect("branch");
    repo.set_head("refs/heads/feature/notes").expect("set head");

    let window = inspect_ok(&root, 1);
    assert_eq!(window.repo_name, "sample-repo");
    assert_eq!(window.branch, "feature/notes");
}

#[test]
fn test_inspect_from_subdirectory_names_repository() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("lattice");
    fs::create_dir_all(&root).expect("mkdir");
    let repo = Repository::init(&root).expect("init");
    commit_files(&repo, &[("crates/core/src/lib.rs", "pub fn core() {}\n")], "add core");

    let window = inspect_ok(&root.join("crates/core"), 1);
    assert_eq!(window.repo_name, "lattice");
}

#[test]
fn test_inspect_detached_head_reports_head() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = Repository::init(dir.path()).expect("init");
    let sha = commit_files(&repo, &[("a.txt", "a\n")], "first");
    repo.set_head_detached(git2::Oid::from_str(&sha).expect("oid"))
        .expect("detach");

    let window = inspect_ok(dir.path(), 1);
    assert_eq!(window.branch, "HEAD");
}

#[test]
fn test_inspect_truncates_large_diffs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = Repository::init(dir.path()).expect("init");
    let line = "let value = compute_something_expensive();\n";
    commit_files(&repo, &[("big.rs", &line.repeat(500))], "big change");

    let window = inspect_ok(dir.path(), 1);
    assert_eq!(window.diff.chars().count(), MAX_DIFF_CHARS);
    assert_eq!(window.diff_stat.insertions, 500);
}

#[test]
fn test_inspect_missing_repository() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("does-not-exist");
    let result = inspect(&missing, 1);
    assert!(matches!(result, Err(GitError::RepositoryNotFound { .. })));
}

#[test]
fn test_committer_records_note() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = Repository::init(dir.path()).expect("init");
    {
        let mut config = repo.config().expect("config");
        config.set_str("user.name", "Note Bot").expect("name");
        config.set_str("user.email", "bot@example.com").expect("email");
    }
    commit_files(&repo, &[("index.md", "home\n")], "site skeleton");

    let note = dir.path().join("src/pages/notes/2026-03-01-demo-note.md");
    fs::create_dir_all(note.parent().expect("parent")).expect("mkdir");
    fs::write(&note, "---\ntitle: \"Demo\"\n---\n\nBody\n").expect("write");

    GitCommitter::new(dir.path())
        .stage_and_commit(&note, "note: auto-generated from demo")
        .expect("commit");

    let window = inspect_ok(dir.path(), 1);
    assert_eq!(window.log.split_once(' ').map(|(_, s)| s), Some("note: auto-generated from demo"));
    assert!(window.stat_text().contains("src/pages/notes/2026-03-01-demo-note.md"));
}

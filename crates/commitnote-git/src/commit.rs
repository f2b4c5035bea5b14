//! Commit propagation into the content repository

use crate::error::GitError;
use crate::inspect::GitRepo;
use git2::ErrorCode;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stage a single file and record it in a new commit
pub trait Committer: Send + Sync {
    /// Stage `file` and commit it with `message`, returning the new commit SHA
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the file cannot be staged or the commit fails.
    fn stage_and_commit(&self, file: &Path, message: &str) -> Result<String, GitError>;
}

/// [`Committer`] backed by the git repository containing `root`
#[derive(Debug, Clone)]
pub struct GitCommitter {
    root: PathBuf,
}

impl GitCommitter {
    /// Create a committer for the repository containing `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Committer for GitCommitter {
    fn stage_and_commit(&self, file: &Path, message: &str) -> Result<String, GitError> {
        let repo = GitRepo::discover(&self.root)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::RepositoryNotFound {
                path: self.root.display().to_string(),
            })?;

        let relative = relative_to(workdir, file)?;
        let raw = repo.raw();

        let mut index = raw.index()?;
        index.add_path(&relative)?;
        index.write()?;
        let tree = raw.find_tree(index.write_tree()?)?;
        let signature = raw.signature()?;

        let parent = match raw.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(err) if matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                None
            }
            Err(err) => return Err(err.into()),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = raw.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        debug!(commit = %oid, path = %relative.display(), "committed note");
        Ok(oid.to_string())
    }
}

fn relative_to(workdir: &Path, file: &Path) -> Result<PathBuf, GitError> {
    let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
    let file = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
    file.strip_prefix(&workdir)
        .map(Path::to_path_buf)
        .map_err(|_| GitError::OutsideWorkdir {
            path: file.display().to_string(),
        })
}

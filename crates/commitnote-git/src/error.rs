// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for commitnote-git

use thiserror::Error;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    /// Error from git2 library
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// Repository not found at the specified path
    #[error("Repository not found: {path}")]
    RepositoryNotFound {
        /// The path that was searched for a repository
        path: String,
    },

    /// Invalid commit reference (branch, tag, or SHA)
    #[error("Invalid commit reference: {reference}")]
    InvalidReference {
        /// The reference string that could not be resolved
        reference: String,
    },

    /// The commit window must cover at least one commit
    #[error("Commit window must be at least 1, got {commits}")]
    InvalidWindow {
        /// The requested window size
        commits: usize,
    },

    /// A file to commit lies outside the repository working directory
    #[error("Path is outside the repository working directory: {path}")]
    OutsideWorkdir {
        /// The offending path
        path: String,
    },
}

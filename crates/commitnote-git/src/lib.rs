// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! commitnote-git: Git change-window inspection for commitnote
//!
//! This library crate reads the most recent commits of a source repository
//! into a [`ChangeWindow`] and commits generated notes back into the content
//! repository.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use commitnote_git::inspect;
//!
//! let window = inspect(".", 1).expect("inspect repo");
//! println!("{} on {}: {}", window.change_id, window.branch, window.log);
//! ```

pub mod commit;
pub mod error;
pub mod inspect;
pub mod window;

pub use commit::{Committer, GitCommitter};
pub use error::GitError;
pub use inspect::{GitRepo, inspect};
pub use window::{ChangeWindow, DiffSummary, FileDiff, MAX_DIFF_CHARS};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::{Committer, GitCommitter};
    pub use crate::error::GitError;
    pub use crate::inspect::{GitRepo, inspect};
    pub use crate::window::{ChangeWindow, DiffSummary};
}

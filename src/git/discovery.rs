// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Repository discovery via gix.
//!
//! ```text
//! <cwd> --gix::discover--> Repository
//!                            .workdir()  -> RepoPaths::root
//!                            .git_dir()  -> RepoPaths::git_dir  (run state lives here)
//!                            .head_name()-> current branch
//! ```
//!
//! Pure Rust, no subprocess. Everything that mutates goes through the CLI.

use std::path::{Path, PathBuf};

use crate::error::{GitError, GitResult, GixError};

/// Locations of a discovered, non-bare repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// Work tree root.
    pub root: PathBuf,
    /// The `.git` directory (per-worktree for linked worktrees).
    pub git_dir: PathBuf,
}

/// Whether `path` is inside a git repository.
#[must_use]
pub fn is_git_repo(path: &Path) -> bool {
    gix::discover(path).is_ok()
}

/// Find the repository containing `path`.
///
/// # Errors
///
/// Returns `GitError::RepoNotFound` when `path` is not inside a repository
/// and `GixError::BareRepository` when it has no work tree.
pub fn discover(path: &Path) -> GitResult<RepoPaths> {
    let start = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let repo = gix::discover(&start).map_err(|e| match e {
        gix::discover::Error::Discover(_) => GitError::RepoNotFound {
            path: start.display().to_string(),
        },
        other => GitError::Gix(GixError::Discover(Box::new(other))),
    })?;
    let root = repo
        .workdir()
        .ok_or(GitError::Gix(GixError::BareRepository))?;
    Ok(RepoPaths {
        root: absolute(root, &start),
        git_dir: absolute(repo.git_dir(), &start),
    })
}

/// Current branch of the repository containing `path`, None when detached.
///
/// # Errors
///
/// Returns a `GitError` if the repository or HEAD cannot be read.
pub fn current_branch(path: &Path) -> GitResult<Option<String>> {
    let repo = gix::discover(path).map_err(|e| GitError::Gix(GixError::Discover(Box::new(e))))?;
    let head = repo.head_name().map_err(|e| GitError::Gix(GixError::Head(e)))?;
    Ok(head.map(|name| name.shorten().to_string()))
}

fn absolute(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined.canonicalize().unwrap_or(joined)
}

// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mutating git commands.
//!
//! ```text
//! opcode --> cmd::<op>(runner, cwd, ..) --> Runner::run --> git
//! ```
//!
//! Every function here changes the repository, its config or a remote, so
//! every call goes through the [`Runner`] handed in. In a dry run that is
//! [`PrintOnly`](super::backend::PrintOnly) and nothing executes.

use std::path::Path;

use super::backend::Runner;
use crate::error::GitResult;

/// Subject line marking stash entries this tool created.
pub const STASH_MESSAGE: &str = "arbor: open changes";

fn git(runner: &dyn Runner, cwd: &Path, args: &[&str]) -> GitResult<()> {
    runner.run(cwd, args).map(drop)
}

/// Check out a branch.
///
/// # Errors
///
/// Returns a `GitError` if the checkout fails.
pub fn checkout(runner: &dyn Runner, cwd: &Path, branch: &str) -> GitResult<()> {
    git(runner, cwd, &["checkout", branch])
}

/// Create a branch at `starting_point` without checking it out.
///
/// # Errors
///
/// Returns a `GitError` if the branch cannot be created.
pub fn create_branch(
    runner: &dyn Runner,
    cwd: &Path,
    branch: &str,
    starting_point: &str,
) -> GitResult<()> {
    git(runner, cwd, &["branch", branch, starting_point])
}

/// Delete a local branch. `force` also deletes unmerged branches.
///
/// # Errors
///
/// Returns a `GitError` if the branch cannot be deleted.
pub fn delete_local_branch(
    runner: &dyn Runner,
    cwd: &Path,
    branch: &str,
    force: bool,
) -> GitResult<()> {
    let flag = if force { "-D" } else { "-d" };
    git(runner, cwd, &["branch", flag, branch])
}

/// Point a branch that is not checked out at `sha`.
///
/// # Errors
///
/// Returns a `GitError` if the ref cannot be moved.
pub fn force_branch(runner: &dyn Runner, cwd: &Path, branch: &str, sha: &str) -> GitResult<()> {
    git(runner, cwd, &["branch", "-f", branch, sha])
}

/// Reset the current branch, index and work tree to `sha`.
///
/// # Errors
///
/// Returns a `GitError` if the reset fails.
pub fn reset_hard(runner: &dyn Runner, cwd: &Path, sha: &str) -> GitResult<()> {
    git(runner, cwd, &["reset", "--hard", sha])
}

/// Drop all uncommitted changes to tracked files.
///
/// # Errors
///
/// Returns a `GitError` if the reset fails.
pub fn discard_open_changes(runner: &dyn Runner, cwd: &Path) -> GitResult<()> {
    git(runner, cwd, &["reset", "--hard"])
}

/// Merge `branch` into the current branch.
///
/// # Errors
///
/// Returns `GitError::Conflict` if the merge stops on conflicts.
pub fn merge(runner: &dyn Runner, cwd: &Path, branch: &str) -> GitResult<()> {
    git(runner, cwd, &["merge", "--no-edit", "--ff", branch])
}

/// Squash `branch` into the index of the current branch, without committing.
///
/// # Errors
///
/// Returns `GitError::Conflict` if the squash stops on conflicts.
pub fn squash_merge(runner: &dyn Runner, cwd: &Path, branch: &str) -> GitResult<()> {
    git(runner, cwd, &["merge", "--squash", "--ff", branch])
}

/// Rebase the current branch onto `branch`.
///
/// # Errors
///
/// Returns `GitError::Conflict` if the rebase stops on conflicts.
pub fn rebase(runner: &dyn Runner, cwd: &Path, branch: &str) -> GitResult<()> {
    git(runner, cwd, &["rebase", branch])
}

/// # Errors
///
/// Returns a `GitError` if no merge can be aborted.
pub fn abort_merge(runner: &dyn Runner, cwd: &Path) -> GitResult<()> {
    git(runner, cwd, &["merge", "--abort"])
}

/// # Errors
///
/// Returns a `GitError` if no rebase can be aborted.
pub fn abort_rebase(runner: &dyn Runner, cwd: &Path) -> GitResult<()> {
    git(runner, cwd, &["rebase", "--abort"])
}

/// Conclude a paused merge with the prepared message.
///
/// # Errors
///
/// Returns a `GitError` if the merge commit cannot be created.
pub fn continue_merge(runner: &dyn Runner, cwd: &Path) -> GitResult<()> {
    git(runner, cwd, &["-c", "core.editor=true", "commit", "--no-edit"])
}

/// Resume a paused rebase.
///
/// # Errors
///
/// Returns `GitError::Conflict` if a later commit conflicts too.
pub fn continue_rebase(runner: &dyn Runner, cwd: &Path) -> GitResult<()> {
    git(runner, cwd, &["-c", "core.editor=true", "rebase", "--continue"])
}

/// Commit everything staged with `message`.
///
/// # Errors
///
/// Returns a `GitError` if the commit fails.
pub fn commit(runner: &dyn Runner, cwd: &Path, message: &str) -> GitResult<()> {
    git(runner, cwd, &["commit", "-m", message])
}

/// Stage every change in the work tree, untracked files included.
///
/// # Errors
///
/// Returns a `GitError` if staging fails.
pub fn stage_all(runner: &dyn Runner, cwd: &Path) -> GitResult<()> {
    git(runner, cwd, &["add", "-A"])
}

/// Stash all uncommitted changes, untracked files included.
///
/// # Errors
///
/// Returns a `GitError` if the stash cannot be created.
pub fn stash(runner: &dyn Runner, cwd: &Path) -> GitResult<()> {
    stage_all(runner, cwd)?;
    git(runner, cwd, &["stash", "push", "-m", STASH_MESSAGE])
}

/// Pop the stash entry at `index`.
///
/// # Errors
///
/// Returns `GitError::Conflict` if the changes conflict with the work tree.
pub fn pop_stash(runner: &dyn Runner, cwd: &Path, index: usize) -> GitResult<()> {
    let entry = format!("stash@{{{index}}}");
    git(runner, cwd, &["stash", "pop", &entry])
}

fn push_args<'a>(flags: &[&'a str], no_push_hook: bool, remote: &'a str) -> Vec<&'a str> {
    let mut args = vec!["push"];
    args.extend_from_slice(flags);
    if no_push_hook {
        args.push("--no-verify");
    }
    args.push(remote);
    args
}

/// Push `branch` to its tracking branch.
///
/// # Errors
///
/// Returns a `GitError` if the push is rejected.
pub fn push(
    runner: &dyn Runner,
    cwd: &Path,
    remote: &str,
    branch: &str,
    no_push_hook: bool,
) -> GitResult<()> {
    let mut args = push_args(&[], no_push_hook, remote);
    args.push(branch);
    git(runner, cwd, &args)
}

/// Force-push `branch`, refusing if the remote moved since the last fetch.
///
/// # Errors
///
/// Returns a `GitError` if the push is rejected.
pub fn force_push(
    runner: &dyn Runner,
    cwd: &Path,
    remote: &str,
    branch: &str,
    no_push_hook: bool,
) -> GitResult<()> {
    let mut args = push_args(&["--force-with-lease"], no_push_hook, remote);
    args.push(branch);
    git(runner, cwd, &args)
}

/// Push `branch` and set it up to track `<remote>/<branch>`.
///
/// # Errors
///
/// Returns a `GitError` if the push is rejected.
pub fn create_tracking_branch(
    runner: &dyn Runner,
    cwd: &Path,
    remote: &str,
    branch: &str,
    no_push_hook: bool,
) -> GitResult<()> {
    let mut args = push_args(&["-u"], no_push_hook, remote);
    args.push(branch);
    git(runner, cwd, &args)
}

/// # Errors
///
/// Returns a `GitError` if the remote branch cannot be deleted.
pub fn delete_tracking_branch(
    runner: &dyn Runner,
    cwd: &Path,
    remote: &str,
    branch: &str,
) -> GitResult<()> {
    git(runner, cwd, &["push", remote, "--delete", branch])
}

/// Fast-forward the current branch to `<remote>/<branch>`.
///
/// # Errors
///
/// Returns a `GitError` if the pull is not a fast-forward.
pub fn pull(runner: &dyn Runner, cwd: &Path, remote: &str, branch: &str) -> GitResult<()> {
    git(runner, cwd, &["pull", "--ff-only", remote, branch])
}

/// Update remote-tracking branches and prune deleted ones.
///
/// # Errors
///
/// Returns a `GitError` if the fetch fails.
pub fn fetch(runner: &dyn Runner, cwd: &Path, remote: &str) -> GitResult<()> {
    git(runner, cwd, &["fetch", "--prune", "--tags", remote])
}

/// # Errors
///
/// Returns a `GitError` if git config cannot be written.
pub fn set_config(runner: &dyn Runner, cwd: &Path, key: &str, value: &str) -> GitResult<()> {
    git(runner, cwd, &["config", key, value])
}

/// # Errors
///
/// Returns a `GitError` if git config cannot be written or the key is absent.
pub fn unset_config(runner: &dyn Runner, cwd: &Path, key: &str) -> GitResult<()> {
    git(runner, cwd, &["config", "--unset", key])
}

// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Opcode execution.

use std::path::PathBuf;
use tracing::debug;

use super::Opcode;
use crate::error::{GitError, GitResult, OperationError};
use crate::git::backend::{GitQuery, Runner};
use crate::git::cmd;
use crate::hosting::Connector;
use crate::lineage::parent_key;

/// What an opcode runs against.
pub struct RunContext<'a> {
    /// Execution capability, [`PrintOnly`](crate::git::backend::PrintOnly) in a dry run.
    pub runner: &'a dyn Runner,
    /// Read-only queries against the real repository.
    pub query: &'a dyn GitQuery,
    pub connector: Option<&'a dyn Connector>,
    /// Directory git commands run in.
    pub cwd: PathBuf,
    pub dry_run: bool,
}

type RunResult = Result<(), OperationError>;

impl Opcode {
    /// Perform this opcode.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Conflict` when git stopped on conflicts that
    /// need a human, `OperationError::Failed` for everything else.
    pub fn run(&self, ctx: &mut RunContext<'_>) -> RunResult {
        let runner = ctx.runner;
        let cwd = ctx.cwd.clone();
        let cwd = cwd.as_path();
        match self {
            Self::AbortMerge => {
                if ctx.query.status()?.merge_in_progress {
                    cmd::abort_merge(runner, cwd)?;
                }
            }
            Self::AbortRebase => {
                if ctx.query.status()?.rebase_in_progress {
                    cmd::abort_rebase(runner, cwd)?;
                }
            }
            Self::ChangeDirectory { dir } => {
                if !dir.is_dir() {
                    return Err(OperationError::failed(format!(
                        "directory {} does not exist",
                        dir.display()
                    )));
                }
                ctx.cwd.clone_from(dir);
            }
            Self::Checkout { branch } => {
                if ctx.query.current_branch()?.as_deref() != Some(branch.as_str()) {
                    cmd::checkout(runner, cwd, branch)?;
                }
            }
            Self::CommitOpenChanges { message } => {
                cmd::stage_all(runner, cwd)?;
                cmd::commit(runner, cwd, message)?;
            }
            Self::ConnectorMergeProposal {
                branch,
                parent,
                number,
                message,
            } => merge_proposal(ctx, branch, parent, *number, message)?,
            Self::ContinueMerge => {
                if ctx.query.status()?.merge_in_progress {
                    conflict_aware(cmd::continue_merge(runner, cwd), ctx)?;
                }
            }
            Self::ContinueRebase => {
                if ctx.query.status()?.rebase_in_progress {
                    conflict_aware(cmd::continue_rebase(runner, cwd), ctx)?;
                }
            }
            Self::CreateBranch {
                branch,
                starting_point,
            } => cmd::create_branch(runner, cwd, branch, starting_point)?,
            Self::CreateBranchExistingParent { branch, ancestors } => {
                let parent = first_existing(ctx.query, ancestors)?;
                cmd::create_branch(runner, cwd, branch, &parent)?;
            }
            Self::CreateTrackingBranch {
                branch,
                remote,
                no_push_hook,
            } => cmd::create_tracking_branch(runner, cwd, remote, branch, *no_push_hook)?,
            Self::DeleteLocalBranch { branch, force } => {
                cmd::delete_local_branch(runner, cwd, branch, *force)?;
            }
            Self::DeleteTrackingBranch { branch, remote } => {
                cmd::delete_tracking_branch(runner, cwd, remote, branch)?;
            }
            Self::DiscardOpenChanges => cmd::discard_open_changes(runner, cwd)?,
            Self::EnsureHasShippableChanges { branch, parent } => {
                if ctx.query.changed_files(parent, branch)?.is_empty() {
                    return Err(OperationError::failed(format!(
                        "the branch \"{branch}\" has no shippable changes"
                    )));
                }
            }
            Self::ForcePushCurrentBranch {
                branch,
                remote,
                no_push_hook,
            } => cmd::force_push(runner, cwd, remote, branch, *no_push_hook)?,
            Self::Merge { branch } => conflict_aware(cmd::merge(runner, cwd, branch), ctx)?,
            Self::PreserveCheckoutHistory { candidates } => {
                preserve_checkout_history(ctx, candidates)?;
            }
            Self::PullCurrentBranch { branch, remote } => {
                conflict_aware(cmd::pull(runner, cwd, remote, branch), ctx)?;
            }
            Self::PushCurrentBranch {
                branch,
                remote,
                no_push_hook,
            } => cmd::push(runner, cwd, remote, branch, *no_push_hook)?,
            Self::Rebase { branch } => conflict_aware(cmd::rebase(runner, cwd, branch), ctx)?,
            Self::RemoveParent { branch, .. } => {
                let key = parent_key(branch);
                if has_config_key(ctx.query, &key)? {
                    cmd::unset_config(runner, cwd, &key)?;
                }
            }
            Self::ResetBranchToSha { branch, sha } => {
                if ctx.query.current_branch()?.as_deref() == Some(branch.as_str()) {
                    cmd::reset_hard(runner, cwd, sha)?;
                } else {
                    cmd::force_branch(runner, cwd, branch, sha)?;
                }
            }
            Self::RestoreOpenChanges => {
                let entries = ctx.query.stash_entries()?;
                match entries
                    .iter()
                    .position(|subject| subject.ends_with(cmd::STASH_MESSAGE))
                {
                    Some(index) => conflict_aware(cmd::pop_stash(runner, cwd, index), ctx)?,
                    None => debug!("no stashed changes to restore"),
                }
            }
            Self::SetExistingParent {
                branch, ancestors, ..
            } => {
                let parent = first_existing(ctx.query, ancestors)?;
                cmd::set_config(runner, cwd, &parent_key(branch), &parent)?;
            }
            Self::SetParent { branch, parent, .. } => {
                cmd::set_config(runner, cwd, &parent_key(branch), parent)?;
            }
            Self::SquashMerge { branch, message } => {
                conflict_aware(cmd::squash_merge(runner, cwd, branch), ctx)?;
                cmd::commit(runner, cwd, message)?;
            }
            Self::StashOpenChanges => {
                if ctx.query.status()?.open_changes {
                    cmd::stash(runner, cwd)?;
                }
            }
        }
        Ok(())
    }
}

/// Classify a failed git call by looking at the work tree it left behind.
fn conflict_aware(result: GitResult<()>, ctx: &RunContext<'_>) -> RunResult {
    match result {
        Ok(()) => Ok(()),
        Err(GitError::CommandFailed { command, message })
            if ctx.query.status().is_ok_and(|status| status.is_unresolved()) =>
        {
            Err(OperationError::Conflict(GitError::Conflict { command, message }))
        }
        Err(err) => Err(err.into()),
    }
}

fn first_existing(query: &dyn GitQuery, candidates: &[String]) -> Result<String, OperationError> {
    for candidate in candidates {
        if query.has_local_branch(candidate)? {
            return Ok(candidate.clone());
        }
    }
    Err(OperationError::failed(format!(
        "none of the branches [{}] exist",
        candidates.join(", ")
    )))
}

fn has_config_key(query: &dyn GitQuery, key: &str) -> GitResult<bool> {
    let pattern = format!("^{}$", regex::escape(key));
    Ok(!query.config_entries(&pattern)?.is_empty())
}

fn merge_proposal(
    ctx: &RunContext<'_>,
    branch: &str,
    parent: &str,
    number: u64,
    message: &str,
) -> RunResult {
    let connector = ctx
        .connector
        .ok_or_else(|| OperationError::failed("no hosting connector is configured"))?;
    if ctx.dry_run {
        println!(
            "(dry run) merge pull request #{number} ({branch} into {parent}) via {}",
            connector.name()
        );
        return Ok(());
    }
    println!("merging pull request #{number} via {}", connector.name());
    connector
        .merge_pull_request(branch, parent, number, message)
        .map_err(|e| OperationError::failed(format!("{e:#}")))
}

/// Leave `@{-1}` on the first candidate that exists and is not current.
fn preserve_checkout_history(ctx: &RunContext<'_>, candidates: &[String]) -> RunResult {
    let Some(current) = ctx.query.current_branch()? else {
        return Ok(());
    };
    let mut wanted = None;
    for candidate in candidates.iter().filter(|c| **c != current) {
        if ctx.query.has_local_branch(candidate)? {
            wanted = Some(candidate);
            break;
        }
    }
    let Some(wanted) = wanted else {
        return Ok(());
    };
    if ctx.query.previously_checked_out_branch()?.as_ref() == Some(wanted) {
        return Ok(());
    }
    cmd::checkout(ctx.runner, &ctx.cwd, wanted)?;
    cmd::checkout(ctx.runner, &ctx.cwd, &current)?;
    Ok(())
}

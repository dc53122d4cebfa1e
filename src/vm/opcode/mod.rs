// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The closed opcode set.
//!
//! ```text
//!                 Opcode
//!   run(ctx) ---------------------> Ok | OperationError::{Conflict, Failed}
//!   continuation() ---------------> what resumes a halted opcode
//!   resumption(conflict, status) -> continuation, or a retry when git is idle
//!   skip() -----------------------> what moves past it without finishing
//!   abort() ----------------------> what cancels an in-flight operation
//!   undo(&UndoSnapshot) ----------> compensating opcodes, None = irreversible
//!   is_skippable() ---------------> declared per kind
//! ```
//!
//! Recovery behavior lives next to each variant in the `match` arms below, so a
//! new variant does not compile until all of it is spelled out.

mod run;


pub use run::RunContext;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::git::backend::RepoStatus;

/// Repository facts captured right before an opcode runs.
///
/// `undo` turns these into compensating opcodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoSnapshot {
    /// Branch checked out before the opcode ran.
    pub active_branch: Option<String>,
    /// HEAD before the opcode ran.
    pub head_sha: Option<String>,
    /// Sha of [`Opcode::undo_subject`] before the opcode ran.
    pub subject_sha: Option<String>,
    /// Directory git commands ran in.
    pub cwd: PathBuf,
}

/// One atomic workflow step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Opcode {
    AbortMerge,
    AbortRebase,
    /// Run subsequent git commands in `dir`.
    ChangeDirectory {
        dir: PathBuf,
    },
    Checkout {
        branch: String,
    },
    /// Stage everything and commit it.
    CommitOpenChanges {
        message: String,
    },
    /// Merge a pull request through the hosting connector.
    ConnectorMergeProposal {
        branch: String,
        parent: String,
        number: u64,
        message: String,
    },
    /// Conclude a merge paused on conflicts, if one is still paused.
    ContinueMerge,
    /// Resume a rebase paused on conflicts, if one is still paused.
    ContinueRebase,
    CreateBranch {
        branch: String,
        starting_point: String,
    },
    /// Create `branch` from the first of `ancestors` that still exists.
    CreateBranchExistingParent {
        branch: String,
        ancestors: Vec<String>,
    },
    CreateTrackingBranch {
        branch: String,
        remote: String,
        no_push_hook: bool,
    },
    DeleteLocalBranch {
        branch: String,
        force: bool,
    },
    DeleteTrackingBranch {
        branch: String,
        remote: String,
    },
    DiscardOpenChanges,
    /// Fail unless `branch` differs from `parent`.
    EnsureHasShippableChanges {
        branch: String,
        parent: String,
    },
    ForcePushCurrentBranch {
        branch: String,
        remote: String,
        no_push_hook: bool,
    },
    Merge {
        branch: String,
    },
    /// Leave git's previous branch (`@{-1}`) on the first existing candidate.
    PreserveCheckoutHistory {
        candidates: Vec<String>,
    },
    PullCurrentBranch {
        branch: String,
        remote: String,
    },
    PushCurrentBranch {
        branch: String,
        remote: String,
        no_push_hook: bool,
    },
    Rebase {
        branch: String,
    },
    RemoveParent {
        branch: String,
        previous: Option<String>,
    },
    /// Move `branch` to `sha`, resetting the work tree if it is checked out.
    ResetBranchToSha {
        branch: String,
        sha: String,
    },
    /// Pop the stash entry created by [`Opcode::StashOpenChanges`], if any.
    RestoreOpenChanges,
    /// Parent `branch` to the first of `ancestors` that still exists.
    SetExistingParent {
        branch: String,
        ancestors: Vec<String>,
        previous: Option<String>,
    },
    SetParent {
        branch: String,
        parent: String,
        previous: Option<String>,
    },
    SquashMerge {
        branch: String,
        message: String,
    },
    /// Stash uncommitted changes, if there are any.
    StashOpenChanges,
}

impl Opcode {
    /// What to run in place of this opcode when a halted run continues.
    #[must_use]
    pub fn continuation(&self) -> Vec<Self> {
        match self {
            Self::Merge { .. } => vec![Self::ContinueMerge],
            Self::Rebase { .. } => vec![Self::ContinueRebase],
            Self::SquashMerge { message, .. } => vec![Self::CommitOpenChanges {
                message: message.clone(),
            }],
            // a conflicting pop leaves the changes applied and the entry stashed
            Self::RestoreOpenChanges => Vec::new(),
            // includes PullCurrentBranch: --ff-only never pauses mid-merge
            _ => vec![self.clone()],
        }
    }

    /// What to run in place of this opcode after it failed.
    ///
    /// Conflicts, and failures that leave git in the middle of this opcode's
    /// operation, resume through [`Opcode::continuation`]. Any other failure
    /// changed nothing, so the opcode itself is retried.
    #[must_use]
    pub fn resumption(&self, conflict: bool, status: &RepoStatus) -> Vec<Self> {
        let paused = match self {
            Self::Merge { .. } | Self::ContinueMerge => status.merge_in_progress,
            Self::Rebase { .. } | Self::ContinueRebase => status.rebase_in_progress,
            Self::SquashMerge { .. } => status.open_changes,
            _ => false,
        };
        if conflict || paused {
            self.continuation()
        } else {
            vec![self.clone()]
        }
    }

    /// What to run instead of this opcode to move past it unfinished.
    #[must_use]
    pub fn skip(&self) -> Vec<Self> {
        match self {
            Self::Merge { .. } | Self::ContinueMerge => vec![Self::AbortMerge],
            Self::Rebase { .. } | Self::ContinueRebase => vec![Self::AbortRebase],
            _ => Vec::new(),
        }
    }

    /// What cancels this opcode's in-flight work before an undo.
    #[must_use]
    pub fn abort(&self) -> Vec<Self> {
        match self {
            Self::Merge { .. } | Self::ContinueMerge => vec![Self::AbortMerge],
            Self::Rebase { .. } | Self::ContinueRebase => vec![Self::AbortRebase],
            Self::SquashMerge { .. } | Self::CommitOpenChanges { .. } => {
                vec![Self::DiscardOpenChanges]
            }
            // a --ff-only pull either moved the branch or did not
            _ => Vec::new(),
        }
    }

    /// Whether a conflict in this opcode may be skipped.
    #[must_use]
    pub const fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::Merge { .. } | Self::Rebase { .. } | Self::ContinueMerge | Self::ContinueRebase
        )
    }

    /// Branch whose sha the interpreter captures into [`UndoSnapshot::subject_sha`].
    #[must_use]
    pub fn undo_subject(&self) -> Option<&str> {
        match self {
            Self::DeleteLocalBranch { branch, .. } | Self::ResetBranchToSha { branch, .. } => {
                Some(branch)
            }
            _ => None,
        }
    }

    /// Opcodes reversing this one, given the state captured before it ran.
    ///
    /// `None` means the effect cannot be reversed (it left the machine).
    /// `Some(vec![])` means there is nothing to reverse.
    #[must_use]
    pub fn undo(&self, before: &UndoSnapshot) -> Option<Vec<Self>> {
        match self {
            Self::AbortMerge
            | Self::AbortRebase
            | Self::DiscardOpenChanges
            | Self::EnsureHasShippableChanges { .. }
            | Self::PreserveCheckoutHistory { .. } => Some(Vec::new()),

            Self::ChangeDirectory { .. } => Some(vec![Self::ChangeDirectory {
                dir: before.cwd.clone(),
            }]),

            Self::Checkout { branch } => Some(
                before
                    .active_branch
                    .iter()
                    .filter(|previous| *previous != branch)
                    .map(|previous| Self::Checkout {
                        branch: previous.clone(),
                    })
                    .collect(),
            ),

            Self::CommitOpenChanges { .. }
            | Self::ContinueMerge
            | Self::ContinueRebase
            | Self::Merge { .. }
            | Self::PullCurrentBranch { .. }
            | Self::Rebase { .. }
            | Self::SquashMerge { .. } => Some(reset_active_branch(before)),

            Self::ConnectorMergeProposal { .. }
            | Self::DeleteTrackingBranch { .. }
            | Self::ForcePushCurrentBranch { .. }
            | Self::PushCurrentBranch { .. } => None,

            Self::CreateBranch { branch, .. } | Self::CreateBranchExistingParent { branch, .. } => {
                Some(vec![Self::DeleteLocalBranch {
                    branch: branch.clone(),
                    force: true,
                }])
            }

            Self::CreateTrackingBranch { branch, remote, .. } => {
                Some(vec![Self::DeleteTrackingBranch {
                    branch: branch.clone(),
                    remote: remote.clone(),
                }])
            }

            Self::DeleteLocalBranch { branch, .. } => {
                before.subject_sha.as_ref().map(|sha| {
                    vec![Self::CreateBranch {
                        branch: branch.clone(),
                        starting_point: sha.clone(),
                    }]
                })
            }

            Self::RemoveParent { branch, previous } => Some(
                previous
                    .iter()
                    .map(|parent| Self::SetParent {
                        branch: branch.clone(),
                        parent: parent.clone(),
                        previous: None,
                    })
                    .collect(),
            ),

            Self::ResetBranchToSha { branch, .. } => {
                before.subject_sha.as_ref().map(|sha| {
                    vec![Self::ResetBranchToSha {
                        branch: branch.clone(),
                        sha: sha.clone(),
                    }]
                })
            }

            Self::RestoreOpenChanges => Some(vec![Self::StashOpenChanges]),
            Self::StashOpenChanges => Some(vec![Self::RestoreOpenChanges]),

            Self::SetExistingParent {
                branch, previous, ..
            }
            | Self::SetParent {
                branch, previous, ..
            } => Some(vec![previous.as_ref().map_or_else(
                || Self::RemoveParent {
                    branch: branch.clone(),
                    previous: None,
                },
                |parent| Self::SetParent {
                    branch: branch.clone(),
                    parent: parent.clone(),
                    previous: None,
                },
            )]),
        }
    }
}

/// Put the branch that was active back where HEAD was.
fn reset_active_branch(before: &UndoSnapshot) -> Vec<Opcode> {
    match (&before.active_branch, &before.head_sha) {
        (Some(branch), Some(sha)) => vec![Opcode::ResetBranchToSha {
            branch: branch.clone(),
            sha: sha.clone(),
        }],
        _ => Vec::new(),
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbortMerge => write!(f, "abort the merge"),
            Self::AbortRebase => write!(f, "abort the rebase"),
            Self::ChangeDirectory { dir } => write!(f, "change directory to {}", dir.display()),
            Self::Checkout { branch } => write!(f, "checkout {branch}"),
            Self::CommitOpenChanges { message } => write!(f, "commit open changes \"{message}\""),
            Self::ConnectorMergeProposal {
                branch,
                parent,
                number,
                ..
            } => write!(f, "merge pull request #{number} ({branch} into {parent})"),
            Self::ContinueMerge => write!(f, "continue the merge"),
            Self::ContinueRebase => write!(f, "continue the rebase"),
            Self::CreateBranch {
                branch,
                starting_point,
            } => write!(f, "create branch {branch} at {starting_point}"),
            Self::CreateBranchExistingParent { branch, ancestors } => {
                write!(f, "create branch {branch} from one of [{}]", ancestors.join(", "))
            }
            Self::CreateTrackingBranch { branch, remote, .. } => {
                write!(f, "push new branch {branch} to {remote}")
            }
            Self::DeleteLocalBranch { branch, .. } => write!(f, "delete branch {branch}"),
            Self::DeleteTrackingBranch { branch, remote } => {
                write!(f, "delete {remote}/{branch}")
            }
            Self::DiscardOpenChanges => write!(f, "discard open changes"),
            Self::EnsureHasShippableChanges { branch, parent } => {
                write!(f, "ensure {branch} has changes against {parent}")
            }
            Self::ForcePushCurrentBranch { branch, remote, .. } => {
                write!(f, "force-push {branch} to {remote}")
            }
            Self::Merge { branch } => write!(f, "merge {branch}"),
            Self::PreserveCheckoutHistory { .. } => write!(f, "restore checkout history"),
            Self::PullCurrentBranch { branch, remote } => write!(f, "pull {remote}/{branch}"),
            Self::PushCurrentBranch { branch, remote, .. } => {
                write!(f, "push {branch} to {remote}")
            }
            Self::Rebase { branch } => write!(f, "rebase onto {branch}"),
            Self::RemoveParent { branch, .. } => write!(f, "remove the parent of {branch}"),
            Self::ResetBranchToSha { branch, sha } => write!(f, "reset {branch} to {sha}"),
            Self::RestoreOpenChanges => write!(f, "restore open changes"),
            Self::SetExistingParent {
                branch, ancestors, ..
            } => write!(
                f,
                "set the parent of {branch} to one of [{}]",
                ancestors.join(", ")
            ),
            Self::SetParent { branch, parent, .. } => {
                write!(f, "set the parent of {branch} to {parent}")
            }
            Self::SquashMerge { branch, .. } => write!(f, "squash-merge {branch}"),
            Self::StashOpenChanges => write!(f, "stash open changes"),
        }
    }
}

// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the branch workflows.

use clap::Args;

/// Arguments for the append command.
#[derive(Debug, Clone, Args)]
pub struct AppendArgs {
    /// Name of the new branch.
    #[arg(value_name = "BRANCH")]
    pub branch: String,
}

/// Arguments for the hack command.
#[derive(Debug, Clone, Args)]
pub struct HackArgs {
    /// Name of the new branch.
    #[arg(value_name = "BRANCH")]
    pub branch: String,
}

/// Arguments for the sync command.
#[derive(Debug, Clone, Default, Args)]
pub struct SyncArgs {
    /// Sync every local branch, not just the current one and its ancestors.
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the ship command.
#[derive(Debug, Clone, Default, Args)]
pub struct ShipArgs {
    /// Branch to ship (default: the current branch).
    #[arg(value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Commit message for the squash commit (default: the branch name).
    #[arg(short, long, value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Merge pull request N through the hosting connector instead of locally.
    #[arg(long = "pr", value_name = "N")]
    pub pull_request: Option<u64>,
}

/// Arguments for the rename-branch command.
#[derive(Debug, Clone, Args)]
pub struct RenameBranchArgs {
    /// New name.
    #[arg(value_name = "NEW")]
    pub new: String,

    /// Branch to rename (default: the current branch).
    #[arg(long = "from", value_name = "OLD")]
    pub old: Option<String>,
}

/// Arguments for the set-parent command.
#[derive(Debug, Clone, Args)]
pub struct SetParentArgs {
    /// The new parent.
    #[arg(value_name = "PARENT")]
    pub parent: String,

    /// Branch to re-parent (default: the current branch).
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,
}

// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for arbor using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! arbor [global options] <command>
//! append <branch>                 new child of the current branch
//! hack <branch>                   new child of the main branch
//! sync [--all]                    update branches from parents and remote
//! ship [branch] [-m msg] [--pr N] squash-merge into the parent
//! rename-branch <new> [--from b]
//! set-parent <parent> [--branch b]
//! continue | skip | undo | discard | status
//! config                          effective options and loaded files
//! ```

pub mod global;
pub mod workflow;


use crate::cli::global::GlobalOptions;
use crate::cli::workflow::{
    AppendArgs, HackArgs, RenameBranchArgs, SetParentArgs, ShipArgs, SyncArgs,
};
use clap::{Parser, Subcommand};

/// Branch Workflow Automation
///
/// Resumable git workflows for stacked feature branches.
#[derive(Debug, Parser)]
#[command(
    name = "arbor",
    author,
    version,
    about = "Resumable branch workflows for git",
    long_about = "arbor Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Every workflow is compiled into a list of git steps. When a\n\
                  step fails, for example on a merge conflict, arbor stops and\n\
                  remembers where it was. Resolve the problem, then run\n\
                  `arbor continue`, `arbor skip` or `arbor undo`.",
    after_help = "CONFIG FILES:\n\n\
                  arbor reads `arbor.toml` from the repository root if it\n\
                  exists. Additional files can be given with --config, those\n\
                  are loaded after it. ARBOR_SECTION__KEY environment variables\n\
                  and --set section.key=value override both. Branch parents\n\
                  are stored in git config under arbor-branch.<name>.parent."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Creates a new branch as a child of the current branch.
    Append(AppendArgs),

    /// Creates a new branch as a child of the main branch.
    Hack(HackArgs),

    /// Updates the current branch (or all branches) with its parents and remote.
    Sync(SyncArgs),

    /// Squash-merges a feature branch into its parent and deletes it.
    Ship(ShipArgs),

    /// Renames a branch, keeping its parent and children.
    #[command(name = "rename-branch")]
    RenameBranch(RenameBranchArgs),

    /// Changes the parent of a branch.
    #[command(name = "set-parent")]
    SetParent(SetParentArgs),

    /// Resumes the unfinished command after resolving conflicts.
    Continue,

    /// Moves past the failed step of the unfinished command.
    Skip,

    /// Reverts what the unfinished command did so far.
    Undo,

    /// Forgets the unfinished command, leaving the repository as it is.
    Discard,

    /// Shows the unfinished command, if any.
    Status,

    /// Lists all options and their values, and the config files used.
    Config,
}

impl Command {
    /// Name recorded in the run state.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Append(_) => "append",
            Self::Hack(_) => "hack",
            Self::Sync(_) => "sync",
            Self::Ship(_) => "ship",
            Self::RenameBranch(_) => "rename-branch",
            Self::SetParent(_) => "set-parent",
            Self::Continue => "continue",
            Self::Skip => "skip",
            Self::Undo => "undo",
            Self::Discard => "discard",
            Self::Status => "status",
            Self::Config => "config",
        }
    }
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}

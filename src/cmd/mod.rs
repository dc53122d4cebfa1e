// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Workflow command implementations.
//!
//! ```text
//! CLI args --> cmd::run_*_command(args, &Context)
//!
//!   handle_unfinished_state   (route to the resume dialog first)
//!            |
//!   preflight                 (current branch, fetch once, lineage)
//!            |
//!   validate + plan           (ValidationError, nothing persisted)
//!            |
//!   execute(RunState)         --> Outcome
//! ```
//!
//! `continue`, `skip`, `undo`, `discard` and `status` act on the persisted
//! run state directly, see [`resume`].

pub mod append;
pub mod config;
pub mod rename;
pub mod resume;
pub mod set_parent;
pub mod ship;
pub mod sync;


use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ArborError, Result, ValidationError};
use crate::git::backend::{GitQuery, PrintOnly, Runner, ShellBackend};
use crate::git::cmd;
use crate::git::discovery::{self, RepoPaths};
use crate::hosting::Connector;
use crate::lineage::Lineage;
use crate::sync::SyncPlanner;
use crate::vm::interpreter::{Machine, Outcome, execute};
use crate::vm::program::{Program, WrapOptions};
use crate::vm::resume::{ResumePrompt, handle_unfinished_state};
use crate::vm::runstate::RunState;
use crate::vm::statefile::StateFile;

/// Everything a workflow command runs against.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub runner: &'a dyn Runner,
    pub query: &'a dyn GitQuery,
    pub connector: Option<&'a dyn Connector>,
    pub prompt: &'a dyn ResumePrompt,
    pub config: &'a Config,
    pub state_file: &'a StateFile,
    /// Repository work tree root.
    pub root: &'a Path,
    /// Directory arbor was invoked from.
    pub cwd: &'a Path,
}

impl<'a> Context<'a> {
    #[must_use]
    pub const fn machine(&self) -> Machine<'a> {
        Machine {
            runner: self.runner,
            query: self.query,
            connector: self.connector,
            state_file: self.state_file,
            cwd: self.cwd,
        }
    }

    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.config.global.dry
    }

    /// Wrap options shared by all workflows. Callers fill in stashing and
    /// the previous-branch candidates.
    fn wrap_options(&self, stash_open_changes: bool, candidates: Vec<String>) -> WrapOptions {
        WrapOptions::builder()
            .dry_run(self.dry_run())
            .run_in_repo_root(true)
            .stash_open_changes(stash_open_changes)
            .previous_branch_candidates(candidates)
            .root_dir(self.root.to_path_buf())
            .invocation_dir(self.cwd.to_path_buf())
            .build()
    }
}

/// Owns the real collaborators behind a [`Context`].
pub struct Session {
    pub paths: RepoPaths,
    pub backend: ShellBackend,
    pub config: Config,
    pub state_file: StateFile,
    pub cwd: PathBuf,
}

impl Session {
    /// Locate the repository around `cwd` and load its configuration.
    ///
    /// `load_config` receives the repository root so it can pick up
    /// `arbor.toml` from there.
    ///
    /// # Errors
    ///
    /// Returns an error if `cwd` is not inside a git work tree, git is not
    /// installed, or the configuration is invalid.
    pub fn open(cwd: &Path, load_config: impl FnOnce(&Path) -> Result<Config>) -> Result<Self> {
        let paths = discovery::discover(cwd).map_err(ArborError::from)?;
        let config = load_config(&paths.root)?;
        let backend = ShellBackend::new(&paths.root)
            .map_err(ArborError::from)?
            .with_print_commands(true);
        let state_file = StateFile::for_repo(&paths);
        debug!(root = %paths.root.display(), state = %state_file.path().display(), "session opened");
        Ok(Self {
            paths,
            backend,
            config,
            state_file,
            cwd: cwd.to_path_buf(),
        })
    }

    #[must_use]
    pub fn context<'a>(
        &'a self,
        prompt: &'a dyn ResumePrompt,
        connector: Option<&'a dyn Connector>,
    ) -> Context<'a> {
        Context {
            runner: &self.backend,
            query: &self.backend,
            connector,
            prompt,
            config: &self.config,
            state_file: &self.state_file,
            root: &self.paths.root,
            cwd: &self.cwd,
        }
    }
}

/// Repository facts every workflow starts from.
#[derive(Debug, Clone)]
pub(crate) struct Preflight {
    pub(crate) initial: String,
    pub(crate) previous: Option<String>,
    pub(crate) lineage: Lineage,
    /// The configured remote exists.
    pub(crate) has_remote: bool,
    pub(crate) open_changes: bool,
}

impl Preflight {
    pub(crate) fn planner<'a>(&'a self, config: &'a Config) -> SyncPlanner<'a> {
        SyncPlanner::new(&self.lineage, &config.branches, &config.sync, self.has_remote)
    }

    /// `[initial, previous]` without duplicates.
    pub(crate) fn previous_candidates(&self) -> Vec<String> {
        let mut candidates = vec![self.initial.clone()];
        if let Some(previous) = &self.previous
            && *previous != self.initial
        {
            candidates.push(previous.clone());
        }
        candidates
    }
}

/// Read the repository state and fetch once when online.
pub(crate) fn preflight(ctx: &Context<'_>) -> Result<Preflight> {
    let initial = ctx
        .query
        .current_branch()?
        .ok_or_else(|| reject(ValidationError::DetachedHead))?;
    let remote = &ctx.config.sync.remote;
    let has_remote = ctx.query.remotes()?.iter().any(|r| r == remote);
    if has_remote && ctx.config.sync.is_online() {
        let print_only = PrintOnly;
        let runner: &dyn Runner = if ctx.dry_run() {
            &print_only
        } else {
            ctx.runner
        };
        info!(remote = %remote, "fetching");
        cmd::fetch(runner, ctx.cwd, remote).map_err(ArborError::from)?;
    }
    Ok(Preflight {
        initial,
        previous: ctx.query.previously_checked_out_branch()?,
        lineage: Lineage::load(ctx.query)?,
        has_remote,
        open_changes: ctx.query.status()?.open_changes,
    })
}

/// Wrap a validation failure for the command boundary.
pub(crate) fn reject(err: ValidationError) -> anyhow::Error {
    ArborError::from(err).into()
}

/// Route to the resume dialog when a run is unfinished.
///
/// `Some` means the dialog handled this invocation.
pub(crate) fn resume_first(ctx: &Context<'_>) -> Result<Option<Outcome>> {
    handle_unfinished_state(&ctx.machine(), ctx.prompt)
}

/// Hand a planned program to the interpreter.
pub(crate) fn run_program(
    ctx: &Context<'_>,
    command: &str,
    initial: &str,
    program: Program,
) -> Result<Outcome> {
    if ctx.dry_run() {
        println!("(dry run) {command} would run:\n{program}");
    }
    let state = RunState::new(command, ctx.dry_run(), initial, program);
    execute(&ctx.machine(), state)
}

/// Fail unless `branch` exists locally.
pub(crate) fn ensure_local_branch(query: &dyn GitQuery, branch: &str) -> Result<()> {
    if query.has_local_branch(branch)? {
        Ok(())
    } else {
        Err(reject(ValidationError::NoSuchBranch {
            branch: branch.to_string(),
        }))
    }
}

/// Fail if `branch` exists locally or at the remote.
pub(crate) fn ensure_new_branch(ctx: &Context<'_>, branch: &str) -> Result<()> {
    if ctx.query.has_local_branch(branch)? {
        return Err(reject(ValidationError::BranchExistsLocally {
            branch: branch.to_string(),
        }));
    }
    let remote = &ctx.config.sync.remote;
    if ctx.query.has_remote_branch(remote, branch)? {
        return Err(reject(ValidationError::BranchExistsRemotely {
            branch: branch.to_string(),
            remote: remote.clone(),
        }));
    }
    Ok(())
}

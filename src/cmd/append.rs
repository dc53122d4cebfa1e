// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `append` and `hack`: create a branch below an existing one.
//!
//! ```text
//! sync parent and its ancestors (root first, with push)
//! create <branch> from the first existing of [parent, ancestors..]
//! record that branch as its parent
//! checkout <branch>
//! [push_new_branches && online]  push new branch
//! ```

use tracing::info;

use super::{
    Context, Preflight, ensure_local_branch, ensure_new_branch, preflight, resume_first, run_program,
};
use crate::cli::workflow::{AppendArgs, HackArgs};
use crate::error::Result;
use crate::sync::BranchInfo;
use crate::vm::interpreter::Outcome;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

/// Create a new branch as a child of the current branch.
///
/// # Errors
///
/// Returns a validation error if the branch already exists or the ancestry
/// of the current branch is unknown.
pub fn run_append_command(args: &AppendArgs, ctx: &Context<'_>) -> Result<Outcome> {
    if let Some(outcome) = resume_first(ctx)? {
        return Ok(outcome);
    }
    let pre = preflight(ctx)?;
    let parent = pre.initial.clone();
    let program = append_program(ctx, &pre, &parent, &args.branch)?;
    info!(branch = %args.branch, parent = %parent, "append");
    run_program(ctx, "append", &pre.initial, program)
}

/// Create a new branch as a child of the main branch.
///
/// # Errors
///
/// Returns a validation error if the branch already exists.
pub fn run_hack_command(args: &HackArgs, ctx: &Context<'_>) -> Result<Outcome> {
    if let Some(outcome) = resume_first(ctx)? {
        return Ok(outcome);
    }
    let pre = preflight(ctx)?;
    let parent = ctx.config.branches.main.clone();
    let program = append_program(ctx, &pre, &parent, &args.branch)?;
    info!(branch = %args.branch, parent = %parent, "hack");
    run_program(ctx, "hack", &pre.initial, program)
}

fn append_program(ctx: &Context<'_>, pre: &Preflight, parent: &str, branch: &str) -> Result<Program> {
    let config = ctx.config;
    ensure_new_branch(ctx, branch)?;
    ensure_local_branch(ctx.query, parent)?;
    let to_sync = pre.lineage.branch_and_ancestors(parent)?;
    pre.lineage.ensure_known(&to_sync, &config.branches)?;

    let mut program = Program::new();
    let infos = BranchInfo::load_all(ctx.query, &to_sync, &config.sync.remote)?;
    pre.planner(config).branches_program(&infos, true, &mut program)?;

    // nearest first
    let candidates: Vec<String> = to_sync.iter().rev().cloned().collect();
    program.append(Opcode::CreateBranchExistingParent {
        branch: branch.to_string(),
        ancestors: candidates.clone(),
    });
    program.append(Opcode::SetExistingParent {
        branch: branch.to_string(),
        ancestors: candidates,
        previous: None,
    });
    program.append(Opcode::Checkout {
        branch: branch.to_string(),
    });
    if config.sync.push_new_branches && pre.planner(config).is_online() {
        program.append(Opcode::CreateTrackingBranch {
            branch: branch.to_string(),
            remote: config.sync.remote.clone(),
            no_push_hook: !config.sync.push_hook,
        });
    }
    program.wrap(&ctx.wrap_options(pre.open_changes, pre.previous_candidates()));
    Ok(program)
}

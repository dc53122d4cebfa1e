// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `sync`: bring branches up to date with their parents and the remote.

use tracing::info;

use super::{Context, preflight, resume_first, run_program};
use crate::cli::workflow::SyncArgs;
use crate::error::Result;
use crate::sync::BranchInfo;
use crate::vm::interpreter::Outcome;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

/// Sync the current branch and its ancestors, or every local branch.
///
/// # Errors
///
/// Returns a validation error if a feature branch to sync has no known parent.
pub fn run_sync_command(args: &SyncArgs, ctx: &Context<'_>) -> Result<Outcome> {
    if let Some(outcome) = resume_first(ctx)? {
        return Ok(outcome);
    }
    let pre = preflight(ctx)?;
    let config = ctx.config;
    let names = if args.all {
        ctx.query.local_branches()?
    } else {
        pre.lineage.branch_and_ancestors(&pre.initial)?
    };
    pre.lineage.ensure_known(&names, &config.branches)?;
    info!(branches = names.len(), all = args.all, "sync");

    let infos = BranchInfo::load_all(ctx.query, &names, &config.sync.remote)?;
    let mut program = Program::new();
    pre.planner(config).branches_program(&infos, true, &mut program)?;
    program.append(Opcode::Checkout {
        branch: pre.initial.clone(),
    });
    program.wrap(&ctx.wrap_options(pre.open_changes, pre.previous_candidates()));
    run_program(ctx, "sync", &pre.initial, program)
}

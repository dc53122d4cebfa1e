// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `rename-branch`: give a feature branch a new name, keeping its lineage.

use tracing::info;

use super::{
    Context, ensure_local_branch, ensure_new_branch, preflight, reject, resume_first, run_program,
};
use crate::cli::workflow::RenameBranchArgs;
use crate::error::{Result, ValidationError};
use crate::vm::interpreter::Outcome;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

/// Rename a branch locally and, when it is tracked, at the remote.
///
/// # Errors
///
/// Returns a validation error if the old branch is missing or not a feature
/// branch, or the new name is taken.
pub fn run_rename_branch_command(args: &RenameBranchArgs, ctx: &Context<'_>) -> Result<Outcome> {
    if let Some(outcome) = resume_first(ctx)? {
        return Ok(outcome);
    }
    let pre = preflight(ctx)?;
    let config = ctx.config;
    let remote = &config.sync.remote;
    let old = args.old.clone().unwrap_or_else(|| pre.initial.clone());
    let new = args.new.clone();

    ensure_local_branch(ctx.query, &old)?;
    if !config.branches.is_feature(&old) {
        return Err(reject(ValidationError::NotAFeatureBranch {
            branch: old,
            action: "renamed".to_string(),
        }));
    }
    ensure_new_branch(ctx, &new)?;
    let parent = pre.lineage.parent(&old).map(ToString::to_string);
    let tracked = ctx.query.has_remote_branch(remote, &old)? && pre.planner(config).is_online();
    info!(old = %old, new = %new, tracked, "rename-branch");

    let mut program = Program::new();
    program.append(Opcode::CreateBranch {
        branch: new.clone(),
        starting_point: old.clone(),
    });
    if let Some(parent) = &parent {
        program.append(Opcode::SetParent {
            branch: new.clone(),
            parent: parent.clone(),
            previous: None,
        });
    }
    for child in pre.lineage.children(&old) {
        program.append(Opcode::SetParent {
            branch: child,
            parent: new.clone(),
            previous: Some(old.clone()),
        });
    }
    if old == pre.initial {
        program.append(Opcode::Checkout {
            branch: new.clone(),
        });
    }
    if tracked {
        program.append(Opcode::CreateTrackingBranch {
            branch: new.clone(),
            remote: remote.clone(),
            no_push_hook: !config.sync.push_hook,
        });
        program.append(Opcode::DeleteTrackingBranch {
            branch: old.clone(),
            remote: remote.clone(),
        });
    }
    program.append(Opcode::RemoveParent {
        branch: old.clone(),
        previous: parent,
    });
    program.append(Opcode::DeleteLocalBranch {
        branch: old.clone(),
        force: true,
    });

    program.wrap(&ctx.wrap_options(false, pre.previous_candidates()));
    run_program(ctx, "rename-branch", &pre.initial, program)
}

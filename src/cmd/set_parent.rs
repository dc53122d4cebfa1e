// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `set-parent`: change where a feature branch sits in the lineage.

use tracing::info;

use super::{Context, ensure_local_branch, reject, resume_first, run_program};
use crate::cli::workflow::SetParentArgs;
use crate::error::{Result, ValidationError};
use crate::lineage::Lineage;
use crate::vm::interpreter::Outcome;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

/// Record `args.parent` as the parent of a branch.
///
/// Runs through the interpreter so `arbor undo` can restore the old parent
/// if a later step of the same invocation fails.
///
/// # Errors
///
/// Returns a validation error if either branch is missing, the branch is
/// not a feature branch, or the new parent is the branch or one of its
/// descendants.
pub fn run_set_parent_command(args: &SetParentArgs, ctx: &Context<'_>) -> Result<Outcome> {
    if let Some(outcome) = resume_first(ctx)? {
        return Ok(outcome);
    }
    let initial = ctx
        .query
        .current_branch()?
        .ok_or_else(|| reject(ValidationError::DetachedHead))?;
    let branch = args.branch.clone().unwrap_or_else(|| initial.clone());
    let parent = args.parent.clone();
    ensure_local_branch(ctx.query, &branch)?;
    ensure_local_branch(ctx.query, &parent)?;
    if !ctx.config.branches.is_feature(&branch) {
        return Err(reject(ValidationError::NotAFeatureBranch {
            branch,
            action: "given a parent".to_string(),
        }));
    }
    let lineage = Lineage::load(ctx.query)?;
    if parent == branch || lineage.is_descendant(&parent, &branch)? {
        return Err(reject(ValidationError::ParentIsDescendant { branch, parent }));
    }
    let previous = lineage.parent(&branch).map(ToString::to_string);
    info!(branch = %branch, parent = %parent, previous = ?previous, "set-parent");

    let program = Program::from(vec![Opcode::SetParent {
        branch,
        parent,
        previous,
    }]);
    run_program(ctx, "set-parent", &initial, program)
}

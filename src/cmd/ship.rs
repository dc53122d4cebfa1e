// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `ship`: squash-merge a feature branch into its parent and delete it.
//!
//! ```text
//! sync parent (with push), sync branch (without push)
//! ensure the branch has changes against its parent
//! checkout parent
//!   --pr N, online:  push branch, merge proposal via connector, pull parent
//!   otherwise:       squash-merge branch, push parent
//! delete tracking branch (tracking, no children, online, or after --pr)
//! delete local branch, forget its parent, hand its children to the parent
//! checkout the initial branch again when shipping another branch
//! ```

use tracing::info;

use super::{Context, ensure_local_branch, preflight, reject, resume_first, run_program};
use crate::cli::workflow::ShipArgs;
use crate::error::{Result, ValidationError};
use crate::sync::BranchInfo;
use crate::vm::interpreter::Outcome;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

/// Ship a feature branch.
///
/// # Errors
///
/// Returns a validation error if the branch is missing, not a feature
/// branch, sits below another unshipped feature branch, has open changes
/// while being the current branch, or a proposal number is given without a
/// hosting connector.
pub fn run_ship_command(args: &ShipArgs, ctx: &Context<'_>) -> Result<Outcome> {
    if let Some(outcome) = resume_first(ctx)? {
        return Ok(outcome);
    }
    let pre = preflight(ctx)?;
    let config = ctx.config;
    let roles = &config.branches;
    let remote = &config.sync.remote;

    let branch = args.branch.clone().unwrap_or_else(|| pre.initial.clone());
    let shipping_initial = branch == pre.initial;
    if shipping_initial && pre.open_changes {
        return Err(reject(ValidationError::OpenChanges {
            action: "shipping".to_string(),
        }));
    }
    ensure_local_branch(ctx.query, &branch)?;
    if !roles.is_feature(&branch) {
        return Err(reject(ValidationError::NotAFeatureBranch {
            branch,
            action: "shipped".to_string(),
        }));
    }
    pre.lineage.ensure_known(std::slice::from_ref(&branch), roles)?;
    let parent = pre
        .lineage
        .parent(&branch)
        .ok_or_else(|| {
            reject(ValidationError::UnknownAncestry {
                branch: branch.clone(),
            })
        })?
        .to_string();
    if !roles.is_perennial(&parent) {
        let unshipped: Vec<String> = pre
            .lineage
            .ancestors(&branch)?
            .into_iter()
            .filter(|ancestor| roles.is_feature(ancestor))
            .collect();
        let oldest = unshipped.first().cloned().unwrap_or_else(|| parent.clone());
        return Err(reject(ValidationError::NestedShip {
            ancestors: unshipped
                .iter()
                .map(|a| format!("\"{a}\""))
                .collect::<Vec<_>>()
                .join(", "),
            oldest,
        }));
    }
    if let Some(number) = args.pull_request
        && ctx.connector.is_none()
    {
        return Err(reject(ValidationError::NoConnector { branch, number }));
    }

    let planner = pre.planner(config);
    let online = planner.is_online();
    let message = args.message.clone().unwrap_or_else(|| branch.clone());
    let has_tracking = ctx.query.has_remote_branch(remote, &branch)?;
    let children = pre.lineage.children(&branch);
    let proposal = args.pull_request.filter(|_| online);
    info!(branch = %branch, parent = %parent, proposal = ?proposal, "ship");

    let mut program = Program::new();
    planner.branch_program(&BranchInfo::load(ctx.query, &parent, remote)?, true, &mut program);
    planner.branch_program(
        &BranchInfo {
            name: branch.clone(),
            has_tracking,
        },
        false,
        &mut program,
    );
    program.append(Opcode::EnsureHasShippableChanges {
        branch: branch.clone(),
        parent: parent.clone(),
    });
    program.append(Opcode::Checkout {
        branch: parent.clone(),
    });
    if let Some(number) = proposal {
        program.append(Opcode::PushCurrentBranch {
            branch: branch.clone(),
            remote: remote.clone(),
            no_push_hook: !config.sync.push_hook,
        });
        program.append(Opcode::ConnectorMergeProposal {
            branch: branch.clone(),
            parent: parent.clone(),
            number,
            message,
        });
        program.append(Opcode::PullCurrentBranch {
            branch: parent.clone(),
            remote: remote.clone(),
        });
    } else {
        program.append(Opcode::SquashMerge {
            branch: branch.clone(),
            message,
        });
        if online && config.sync.push_branches {
            program.append(Opcode::PushCurrentBranch {
                branch: parent.clone(),
                remote: remote.clone(),
                no_push_hook: !config.sync.push_hook,
            });
        }
    }
    let remote_is_ours = proposal.is_some() || (has_tracking && children.is_empty() && online);
    if config.ship.delete_tracking_branch && remote_is_ours {
        program.append(Opcode::DeleteTrackingBranch {
            branch: branch.clone(),
            remote: remote.clone(),
        });
    }
    program.append(Opcode::DeleteLocalBranch {
        branch: branch.clone(),
        force: true,
    });
    program.append(Opcode::RemoveParent {
        branch: branch.clone(),
        previous: Some(parent.clone()),
    });
    for child in children {
        program.append(Opcode::SetParent {
            branch: child,
            parent: parent.clone(),
            previous: Some(branch.clone()),
        });
    }
    if !shipping_initial {
        program.append(Opcode::Checkout {
            branch: pre.initial.clone(),
        });
    }
    program.wrap(&ctx.wrap_options(
        !shipping_initial && pre.open_changes,
        pre.previous_candidates(),
    ));
    run_program(ctx, "ship", &pre.initial, program)
}

// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Commands acting on the persisted run state: `continue`, `skip`, `undo`,
//! `discard` and `status`.

use std::fmt::Write;
use tracing::info;

use super::Context;
use crate::error::Result;
use crate::vm::interpreter::Outcome;
use crate::vm::resume::{continue_run, load_unfinished, skip_run, undo_run};
use crate::vm::runstate::RunState;
use crate::vm::statefile::LoadedState;

/// Resume the unfinished command.
///
/// # Errors
///
/// Returns a validation error if nothing is unfinished or conflicts remain.
pub fn run_continue_command(ctx: &Context<'_>) -> Result<Outcome> {
    let machine = ctx.machine();
    let state = load_unfinished(&machine, "continue")?;
    continue_run(&machine, &state)
}

/// Move past the step the unfinished command stopped at.
///
/// # Errors
///
/// Returns a validation error if nothing is unfinished or the step cannot
/// be skipped.
pub fn run_skip_command(ctx: &Context<'_>) -> Result<Outcome> {
    let machine = ctx.machine();
    let state = load_unfinished(&machine, "skip")?;
    skip_run(&machine, &state)
}

/// Abort the unfinished command and reverse what it did.
///
/// # Errors
///
/// Returns a validation error if nothing is unfinished.
pub fn run_undo_command(ctx: &Context<'_>) -> Result<Outcome> {
    let machine = ctx.machine();
    let state = load_unfinished(&machine, "undo")?;
    undo_run(&machine, &state)
}

/// Forget the unfinished command without touching the repository.
///
/// # Errors
///
/// Returns a validation error if nothing is unfinished.
pub fn run_discard_command(ctx: &Context<'_>) -> Result<Outcome> {
    let state = load_unfinished(&ctx.machine(), "discard")?;
    ctx.state_file.delete()?;
    info!(command = %state.command, "discarded unfinished run");
    println!("Discarded the unfinished \"{}\" command.", state.command);
    Ok(Outcome::Finished)
}

/// Print what is unfinished.
///
/// # Errors
///
/// Returns a protocol error if the state file is corrupt.
pub fn run_status_command(ctx: &Context<'_>) -> Result<Outcome> {
    match ctx.state_file.load()? {
        LoadedState::Unfinished(state) => print!("{}", describe(&state)),
        LoadedState::Absent | LoadedState::Finished(_) => println!("No unfinished command."),
    }
    Ok(Outcome::Finished)
}

/// Human-readable summary of a halted run.
#[must_use]
pub fn describe(state: &RunState) -> String {
    let mut out = String::new();
    if let Some(details) = &state.unfinished_details {
        let _ = writeln!(
            out,
            "The \"{}\" command stopped on branch \"{}\" at {}.",
            state.command,
            details.end_branch,
            details.end_time.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let mut choices = vec!["continue"];
        if details.can_skip {
            choices.push("skip");
        }
        choices.extend(["undo", "discard"]);
        let _ = writeln!(
            out,
            "Run one of: {}",
            choices
                .iter()
                .map(|c| format!("arbor {c}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if !state.pending_program.is_empty() {
        let _ = write!(out, "Remaining steps:\n{}", state.pending_program);
    }
    if !state.irreversible.is_empty() {
        let _ = writeln!(out, "Cannot be undone: {}", state.irreversible.join(", "));
    }
    out
}

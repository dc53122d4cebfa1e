// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Executes a run state's pending program.
//!
//! ```text
//! loop:
//!   opcode = pending.pop_front()        (removed before it runs)
//!   snapshot = branch, HEAD, subject sha
//!   opcode.run()
//!     Ok  --> record opcode.undo(snapshot)
//!     Err --> dry run: error, nothing saved
//!             pending = resumption + rest (retry unless git is mid-operation)
//!             unfinished_details = { end_branch, end_time, can_skip }
//!             save state --> Outcome::Halted
//! empty:
//!   delete state --> Outcome::Finished | Outcome::Undone
//! ```
//!
//! This is the only place that decides between halting and returning an
//! error: opcode failures halt, state file failures are errors.


use chrono::Utc;
use std::path::Path;
use tracing::{debug, info, warn};

use super::opcode::{Opcode, RunContext, UndoSnapshot};
use super::runstate::{InflightUndo, RunState, UnfinishedDetails};
use super::statefile::StateFile;
use crate::error::{ArborError, ExitClass, OperationError, Result};
use crate::git::backend::{GitQuery, PrintOnly, Runner};
use crate::hosting::Connector;

/// Everything the interpreter runs against.
#[derive(Clone, Copy)]
pub struct Machine<'a> {
    /// Real execution capability. Replaced by `PrintOnly` for dry runs.
    pub runner: &'a dyn Runner,
    pub query: &'a dyn GitQuery,
    pub connector: Option<&'a dyn Connector>,
    pub state_file: &'a StateFile,
    /// Directory the command was invoked from.
    pub cwd: &'a Path,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every opcode ran.
    Finished,
    /// An undo run completed. Lists effects it could not reverse.
    Undone { irreversible: Vec<String> },
    /// Stopped before completion, state saved.
    Halted(UnfinishedDetails),
    /// The user chose to leave an unfinished run alone.
    Parked,
}

impl Outcome {
    #[must_use]
    pub const fn exit_class(&self) -> ExitClass {
        match self {
            Self::Finished | Self::Undone { .. } => ExitClass::Success,
            Self::Halted(_) | Self::Parked => ExitClass::Halted,
        }
    }
}

/// Run `run_state`'s pending program to completion or to the first failure.
///
/// # Errors
///
/// Returns an error if the state file cannot be written or deleted, or if an
/// opcode fails during a dry run (nothing is persisted for those). Other
/// opcode failures are reported as [`Outcome::Halted`].
pub fn execute(machine: &Machine<'_>, mut run_state: RunState) -> Result<Outcome> {
    let print_only = PrintOnly;
    let runner: &dyn Runner = if run_state.dry_run {
        &print_only
    } else {
        machine.runner
    };
    let mut ctx = RunContext {
        runner,
        query: machine.query,
        connector: machine.connector,
        cwd: machine.cwd.to_path_buf(),
        dry_run: run_state.dry_run,
    };
    let track_undo = !run_state.is_undo && !run_state.dry_run;
    info!(
        command = %run_state.command,
        opcodes = run_state.pending_program.len(),
        dry_run = run_state.dry_run,
        undo = run_state.is_undo,
        "executing program"
    );

    while let Some(opcode) = run_state.pending_program.pop_front() {
        let before = track_undo.then(|| snapshot(&opcode, &ctx));
        debug!(opcode = %opcode, "run");
        match opcode.run(&mut ctx) {
            Ok(()) => {
                if let Some(before) = before {
                    match run_state.inflight_undo.take() {
                        Some(inflight) => run_state.record_undo(inflight.opcode, inflight.undo),
                        None => run_state.record_undo(opcode.to_string(), opcode.undo(&before)),
                    }
                }
            }
            Err(err) => return halt(machine, &ctx, run_state, &opcode, &err, before),
        }
    }

    machine.state_file.delete()?;
    if run_state.is_undo {
        report_irreversible(&run_state.irreversible);
        return Ok(Outcome::Undone {
            irreversible: run_state.irreversible,
        });
    }
    info!(command = %run_state.command, "finished");
    Ok(Outcome::Finished)
}

/// Capture what `opcode.undo` needs. Best effort: a failed query leaves a gap.
fn snapshot(opcode: &Opcode, ctx: &RunContext<'_>) -> UndoSnapshot {
    let query = ctx.query;
    let subject_sha = opcode
        .undo_subject()
        .and_then(|branch| query.sha_of(&format!("refs/heads/{branch}")).ok().flatten());
    UndoSnapshot {
        active_branch: query.current_branch().ok().flatten(),
        head_sha: query.sha_of("HEAD").ok().flatten(),
        subject_sha,
        cwd: ctx.cwd.clone(),
    }
}

fn halt(
    machine: &Machine<'_>,
    ctx: &RunContext<'_>,
    mut run_state: RunState,
    opcode: &Opcode,
    err: &OperationError,
    before: Option<UndoSnapshot>,
) -> Result<Outcome> {
    if run_state.dry_run {
        warn!(command = %run_state.command, opcode = %opcode, "dry run failed");
        return Err(ArborError::Other(
            format!("(dry run) \"{opcode}\" would fail: {err}").into_boxed_str(),
        )
        .into());
    }
    let can_skip = err.is_conflict() && opcode.is_skippable();
    let status = ctx.query.status().unwrap_or_default();
    let continuation = opcode.resumption(err.is_conflict(), &status);
    if let Some(before) = before {
        let undo = opcode.undo(&before);
        if continuation.is_empty() {
            // the opcode took effect and nothing will finish it later
            run_state.record_undo(opcode.to_string(), undo);
        } else if run_state.inflight_undo.is_none() {
            run_state.inflight_undo = Some(InflightUndo {
                opcode: opcode.to_string(),
                undo,
            });
        }
    }
    run_state.pending_program.prepend_all(continuation);

    let end_branch = ctx
        .query
        .current_branch()
        .ok()
        .flatten()
        .unwrap_or_else(|| run_state.initial_active_branch.clone());
    let details = UnfinishedDetails {
        end_branch,
        end_time: Utc::now(),
        can_skip,
    };
    run_state.unfinished_details = Some(details.clone());
    machine.state_file.save(&run_state)?;

    warn!(
        command = %run_state.command,
        opcode = %opcode,
        conflict = err.is_conflict(),
        can_skip,
        "halted"
    );
    eprintln!("\nerror: {err}\n");
    if err.is_conflict() {
        eprintln!("To continue after resolving the conflicts, run \"arbor continue\".");
    } else {
        eprintln!("To retry the failed step, run \"arbor continue\".");
    }
    eprintln!("To go back to where you started, run \"arbor undo\".");
    if can_skip {
        eprintln!("To move past this step, run \"arbor skip\".");
    }
    Ok(Outcome::Halted(details))
}

fn report_irreversible(irreversible: &[String]) {
    if irreversible.is_empty() {
        return;
    }
    eprintln!("\nThese steps cannot be undone and were left as they are:");
    for description in irreversible {
        eprintln!("  - {description}");
    }
}

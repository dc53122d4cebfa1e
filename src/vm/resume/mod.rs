// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resuming a halted run.
//!
//! ```text
//! any workflow command
//!        |
//!        v
//! handle_unfinished_state
//!   Absent      --> proceed
//!   Finished    --> delete stale file, proceed
//!   Unfinished  --> ResumePrompt::ask
//!                     continue --> continue_run   (conflicts must be resolved)
//!                     skip     --> skip_run       (only if can_skip)
//!                     undo     --> undo_run
//!                     discard  --> delete state, proceed
//!                     quit     --> Outcome::Parked, state untouched
//!                     other    --> ProtocolError (fatal)
//! ```


use chrono::{DateTime, Utc};
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::info;

use super::interpreter::{Machine, Outcome, execute};
use super::runstate::RunState;
use super::statefile::LoadedState;
use crate::error::{ArborError, ProtocolError, Result, ValidationError};

/// The user's decision about an unfinished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Continue,
    Skip,
    Undo,
    Discard,
    Quit,
}

impl FromStr for Response {
    type Err = ProtocolError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "continue" => Ok(Self::Continue),
            "skip" => Ok(Self::Skip),
            "undo" => Ok(Self::Undo),
            "discard" => Ok(Self::Discard),
            "quit" => Ok(Self::Quit),
            other => Err(ProtocolError::UnexpectedResponse(other.to_string())),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Continue => "continue",
            Self::Skip => "skip",
            Self::Undo => "undo",
            Self::Discard => "discard",
            Self::Quit => "quit",
        };
        f.write_str(name)
    }
}

/// What the prompt shows about the unfinished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnfinishedPrompt {
    pub command: String,
    pub end_branch: String,
    pub end_time: DateTime<Utc>,
    pub can_skip: bool,
}

impl UnfinishedPrompt {
    /// Responses worth offering.
    #[must_use]
    pub fn choices(&self) -> Vec<Response> {
        let mut choices = vec![Response::Continue];
        if self.can_skip {
            choices.push(Response::Skip);
        }
        choices.extend([Response::Undo, Response::Discard, Response::Quit]);
        choices
    }
}

/// Decides what to do with an unfinished run.
pub trait ResumePrompt {
    /// Raw answer. Anything but the five response names is a protocol error.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::DialogFailed` if the question cannot be asked.
    fn ask(&self, prompt: &UnfinishedPrompt) -> std::result::Result<String, ProtocolError>;
}

/// Asks on stderr, reads one line from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl ResumePrompt for TerminalPrompt {
    fn ask(&self, prompt: &UnfinishedPrompt) -> std::result::Result<String, ProtocolError> {
        let choices = prompt
            .choices()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write_question(prompt, &choices).map_err(ProtocolError::DialogFailed)?;

        let mut answer = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut answer)
            .map_err(ProtocolError::DialogFailed)?;
        Ok(answer.trim().to_string())
    }
}

fn write_question(prompt: &UnfinishedPrompt, choices: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr().lock();
    writeln!(
        stderr,
        "The \"{}\" command stopped on branch \"{}\" at {}.",
        prompt.command,
        prompt.end_branch,
        prompt.end_time.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    write!(stderr, "What do you want to do? [{choices}]: ")?;
    stderr.flush()
}

/// Always gives the same answer (`--on-unfinished`).
#[derive(Debug, Clone)]
pub struct FixedResponse(pub String);

impl ResumePrompt for FixedResponse {
    fn ask(&self, _prompt: &UnfinishedPrompt) -> std::result::Result<String, ProtocolError> {
        Ok(self.0.clone())
    }
}

/// Route to the resume dialog if a run is unfinished.
///
/// Returns `None` when the requested workflow may start.
///
/// # Errors
///
/// Returns a `ProtocolError` for a corrupt state file or an unknown answer
/// (the state file is left untouched), a `ValidationError` when the chosen
/// response is not possible right now.
pub fn handle_unfinished_state(
    machine: &Machine<'_>,
    prompt: &dyn ResumePrompt,
) -> Result<Option<Outcome>> {
    let state = match machine.state_file.load()? {
        LoadedState::Absent => return Ok(None),
        LoadedState::Finished(stale) => {
            info!(command = %stale.command, "removing finished run state");
            machine.state_file.delete()?;
            return Ok(None);
        }
        LoadedState::Unfinished(state) => state,
    };
    let Some(details) = state.unfinished_details.clone() else {
        return Ok(None);
    };
    let answer = prompt.ask(&UnfinishedPrompt {
        command: state.command.clone(),
        end_branch: details.end_branch,
        end_time: details.end_time,
        can_skip: details.can_skip,
    })?;
    let response: Response = answer.parse()?;
    info!(command = %state.command, %response, "resuming unfinished run");
    match response {
        Response::Continue => continue_run(machine, &state).map(Some),
        Response::Skip => skip_run(machine, &state).map(Some),
        Response::Undo => undo_run(machine, &state).map(Some),
        Response::Discard => {
            machine.state_file.delete()?;
            Ok(None)
        }
        Response::Quit => Ok(Some(Outcome::Parked)),
    }
}

/// Load the unfinished run for an explicit continue/skip/undo/discard.
///
/// # Errors
///
/// Returns `ValidationError::NothingToResume` when no run is unfinished.
pub fn load_unfinished(machine: &Machine<'_>, action: &str) -> Result<RunState> {
    match machine.state_file.load()? {
        LoadedState::Unfinished(state) => Ok(state),
        LoadedState::Finished(_) => {
            machine.state_file.delete()?;
            Err(nothing_to(action))
        }
        LoadedState::Absent => Err(nothing_to(action)),
    }
}

fn nothing_to(action: &str) -> anyhow::Error {
    ArborError::from(ValidationError::NothingToResume {
        action: action.to_string(),
    })
    .into()
}

/// Re-enter the persisted program.
///
/// # Errors
///
/// Returns `ValidationError::UnresolvedConflicts` while conflicts remain.
pub fn continue_run(machine: &Machine<'_>, state: &RunState) -> Result<Outcome> {
    if machine.query.status()?.conflicts {
        return Err(ArborError::from(ValidationError::UnresolvedConflicts).into());
    }
    execute(machine, state.create_continue_run_state())
}

/// Move past the halted opcode.
///
/// # Errors
///
/// Returns `ValidationError::CannotSkip` if the halted opcode is not skippable.
pub fn skip_run(machine: &Machine<'_>, state: &RunState) -> Result<Outcome> {
    let skipped = state.create_skip_run_state()?;
    execute(machine, skipped)
}

/// Abort the halted operation and reverse everything that ran.
///
/// # Errors
///
/// Returns an error only if the state file cannot be written.
pub fn undo_run(machine: &Machine<'_>, state: &RunState) -> Result<Outcome> {
    execute(machine, state.create_undo_run_state())
}

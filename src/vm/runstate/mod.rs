// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Durable checkpoint of one workflow invocation.
//!
//! ```text
//!            build program
//!                 |
//!                 v
//!   RunState { pending_program, undo_program, .. }
//!                 |  interpreter pops and runs
//!        +--------+---------+
//!        v                  v
//!    finished            halted: unfinished_details = Some(..)
//!   (state deleted)      (state saved)
//!                           |
//!        +---------+--------+--------+
//!        v         v        v        v
//!    continue    skip      undo    discard / quit
//! ```


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::opcode::Opcode;
use super::program::Program;
use crate::error::{ArborResult, ValidationError};

/// Where and how a halted run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfinishedDetails {
    /// Branch checked out when execution halted.
    pub end_branch: String,
    pub end_time: DateTime<Utc>,
    /// Whether the failing opcode declared itself skippable and failed on conflicts.
    pub can_skip: bool,
}

/// Undo of an opcode that halted, applied once its continuation completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflightUndo {
    /// Description of the halted opcode.
    pub opcode: String,
    /// `None` when the halted opcode cannot be reversed.
    pub undo: Option<Vec<Opcode>>,
}

/// One workflow invocation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Workflow that produced this state.
    pub command: String,
    pub dry_run: bool,
    pub initial_active_branch: String,
    /// Opcodes not yet executed successfully.
    pub pending_program: Program,
    /// Compensating opcodes for everything that ran, most recent first.
    #[serde(default)]
    pub undo_program: Program,
    /// Effects that ran and cannot be reversed.
    #[serde(default)]
    pub irreversible: Vec<String>,
    /// Undo captured for the opcode at the halt position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflight_undo: Option<InflightUndo>,
    /// This run reverses an earlier one.
    #[serde(default)]
    pub is_undo: bool,
    /// Present only while halted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unfinished_details: Option<UnfinishedDetails>,
}

impl RunState {
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        dry_run: bool,
        initial_active_branch: impl Into<String>,
        program: Program,
    ) -> Self {
        Self {
            command: command.into(),
            dry_run,
            initial_active_branch: initial_active_branch.into(),
            pending_program: program,
            undo_program: Program::new(),
            irreversible: Vec::new(),
            inflight_undo: None,
            is_undo: false,
            unfinished_details: None,
        }
    }

    #[must_use]
    pub const fn is_unfinished(&self) -> bool {
        self.unfinished_details.is_some()
    }

    /// Record the reversal of an opcode that just completed.
    pub fn record_undo(&mut self, description: String, undo: Option<Vec<Opcode>>) {
        match undo {
            Some(opcodes) => self.undo_program.prepend_all(opcodes),
            None => self.irreversible.push(description),
        }
    }

    /// Continue with the persisted program. Resolution is the caller's check.
    #[must_use]
    pub fn create_continue_run_state(&self) -> Self {
        let mut state = self.clone();
        state.unfinished_details = None;
        state
    }

    /// Replace the halted opcode with its `skip()` sequence.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::CannotSkip` when the halted opcode is not
    /// skippable or did not fail on conflicts.
    pub fn create_skip_run_state(&self) -> ArborResult<Self> {
        let can_skip = self
            .unfinished_details
            .as_ref()
            .is_some_and(|details| details.can_skip);
        if !can_skip {
            return Err(ValidationError::CannotSkip {
                command: self.command.clone(),
            }
            .into());
        }
        let mut state = self.create_continue_run_state();
        if let Some(front) = state.pending_program.pop_front() {
            state.pending_program.prepend_all(front.skip());
        }
        state.inflight_undo = None;
        Ok(state)
    }

    /// Program that aborts the halted operation and reverses what ran.
    ///
    /// The original pending program is dropped.
    #[must_use]
    pub fn create_undo_run_state(&self) -> Self {
        let mut pending = Program::new();
        if let Some(front) = self.pending_program.peek() {
            pending.append_all(front.abort());
        }
        pending.append_all(self.undo_program.clone());
        Self {
            command: self.command.clone(),
            dry_run: self.dry_run,
            initial_active_branch: self.initial_active_branch.clone(),
            pending_program: pending,
            undo_program: Program::new(),
            irreversible: self.irreversible.clone(),
            inflight_undo: None,
            is_undo: true,
            unfinished_details: None,
        }
    }
}

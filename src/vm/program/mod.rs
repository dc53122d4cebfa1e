// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Opcode sequences.
//!
//! ```text
//! planning:  append / append_all            --> [op1, op2, ...]
//! wrap:      [Stash?, ChangeDirectory(root)?,
//!             op1, op2, ...,
//!             PreserveCheckoutHistory?, ChangeDirectory(back)?, Restore?]
//! running:   pop_front / prepend (continuations, skips)
//! ```


use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;

use super::opcode::Opcode;

/// Ordered opcodes. Insertion order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program(VecDeque<Opcode>);

/// Bracketing applied once, after planning.
#[derive(Debug, Clone, Default, Builder)]
pub struct WrapOptions {
    #[builder(default)]
    pub dry_run: bool,
    /// Run git from the repository root, returning to `invocation_dir` at the end.
    #[builder(default)]
    pub run_in_repo_root: bool,
    #[builder(default)]
    pub stash_open_changes: bool,
    /// Branches to leave as git's previous branch, first existing wins.
    #[builder(default)]
    pub previous_branch_candidates: Vec<String>,
    pub root_dir: Option<PathBuf>,
    pub invocation_dir: Option<PathBuf>,
}

impl Program {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, opcode: Opcode) {
        self.0.push_back(opcode);
    }

    /// Append every opcode of `other`, in order.
    pub fn append_all(&mut self, other: impl IntoIterator<Item = Opcode>) {
        self.0.extend(other);
    }

    pub fn prepend(&mut self, opcode: Opcode) {
        self.0.push_front(opcode);
    }

    /// Put `opcodes` in front, keeping their order.
    pub fn prepend_all(&mut self, opcodes: impl IntoIterator<Item = Opcode>) {
        let mut head: VecDeque<Opcode> = opcodes.into_iter().collect();
        head.append(&mut self.0);
        self.0 = head;
    }

    pub fn pop_front(&mut self) -> Option<Opcode> {
        self.0.pop_front()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Opcode> {
        self.0.front()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Opcode> {
        self.0.iter()
    }

    /// Surround the program with setup and teardown opcodes.
    ///
    /// Stash comes first and restore comes last, after the opcode that fixes
    /// up the checkout history.
    pub fn wrap(&mut self, options: &WrapOptions) {
        let change_dir = options
            .root_dir
            .as_ref()
            .zip(options.invocation_dir.as_ref())
            .filter(|(root, invocation)| options.run_in_repo_root && root != invocation);
        if let Some((root, _)) = change_dir {
            self.prepend(Opcode::ChangeDirectory { dir: root.clone() });
        }
        if !options.dry_run {
            self.append(Opcode::PreserveCheckoutHistory {
                candidates: options.previous_branch_candidates.clone(),
            });
        }
        if let Some((_, invocation)) = change_dir {
            self.append(Opcode::ChangeDirectory {
                dir: invocation.clone(),
            });
        }
        if options.stash_open_changes {
            self.prepend(Opcode::StashOpenChanges);
            self.append(Opcode::RestoreOpenChanges);
        }
    }
}

impl From<Vec<Opcode>> for Program {
    fn from(opcodes: Vec<Opcode>) -> Self {
        Self(opcodes.into())
    }
}

impl IntoIterator for Program {
    type Item = Opcode;
    type IntoIter = std::collections::vec_deque::IntoIter<Opcode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, opcode) in self.0.iter().enumerate() {
            writeln!(f, "{}. {opcode}", index + 1)?;
        }
        Ok(())
    }
}

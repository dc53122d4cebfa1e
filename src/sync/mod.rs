// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Branch-sync planner.
//!
//! Turns a branch and its lineage into the opcodes that bring it up to date.
//!
//! ```text
//! per branch, root to leaf:
//!   checkout <branch>
//!   [tracking && online]   merge/rebase <remote>/<branch>
//!   [has parent]           merge/rebase <parent>
//!   [push && online]       push | force-push | push new branch
//! ```
//!
//! Fetching is not planned here. The workflow fetches once per invocation
//! before asking for tracking information.

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::config::types::{BranchesConfig, SyncConfig, SyncStrategy};
use crate::error::{ArborResult, GitResult};
use crate::git::backend::GitQuery;
use crate::lineage::Lineage;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

/// What the planner needs to know about one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    /// A `<remote>/<name>` counterpart exists.
    pub has_tracking: bool,
}

impl BranchInfo {
    /// Look up the tracking status of `name` at `remote`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the ref lookup fails.
    pub fn load(query: &dyn GitQuery, name: &str, remote: &str) -> GitResult<Self> {
        Ok(Self {
            name: name.to_string(),
            has_tracking: query.has_remote_branch(remote, name)?,
        })
    }

    /// Look up several branches at once.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if any ref lookup fails.
    pub fn load_all(query: &dyn GitQuery, names: &[String], remote: &str) -> GitResult<Vec<Self>> {
        names
            .iter()
            .map(|name| Self::load(query, name, remote))
            .collect()
    }
}

/// Plans sync opcodes for branches of one repository.
#[derive(Debug, Clone, Copy)]
pub struct SyncPlanner<'a> {
    lineage: &'a Lineage,
    roles: &'a BranchesConfig,
    sync: &'a SyncConfig,
    has_remote: bool,
}

impl<'a> SyncPlanner<'a> {
    /// `has_remote` is whether the configured remote exists at all.
    #[must_use]
    pub const fn new(
        lineage: &'a Lineage,
        roles: &'a BranchesConfig,
        sync: &'a SyncConfig,
        has_remote: bool,
    ) -> Self {
        Self {
            lineage,
            roles,
            sync,
            has_remote,
        }
    }

    /// Remote-touching steps are allowed.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.has_remote && self.sync.is_online()
    }

    /// Append the sync opcodes for one branch.
    ///
    /// `push` lets callers sync without publishing, e.g. the branch being
    /// shipped.
    pub fn branch_program(&self, branch: &BranchInfo, push: bool, program: &mut Program) {
        let name = branch.name.as_str();
        let perennial = self.roles.is_perennial(name);
        let tracking_strategy = if perennial {
            self.sync.perennial_strategy
        } else {
            self.sync.strategy
        };
        let remote = self.sync.remote.as_str();
        debug!(branch = name, tracking = branch.has_tracking, push, "planning sync");

        program.append(Opcode::Checkout {
            branch: name.to_string(),
        });
        if branch.has_tracking && self.is_online() {
            program.append(reconcile(tracking_strategy, format!("{remote}/{name}")));
        }
        if let Some(parent) = self.lineage.parent(name) {
            program.append(reconcile(self.sync.strategy, parent.to_string()));
        }
        if !(push && self.sync.push_branches && self.is_online()) {
            return;
        }
        let no_push_hook = !self.sync.push_hook;
        if branch.has_tracking {
            // a rebased feature branch has rewritten history
            if !perennial && self.sync.strategy == SyncStrategy::Rebase {
                program.append(Opcode::ForcePushCurrentBranch {
                    branch: name.to_string(),
                    remote: remote.to_string(),
                    no_push_hook,
                });
            } else {
                program.append(Opcode::PushCurrentBranch {
                    branch: name.to_string(),
                    remote: remote.to_string(),
                    no_push_hook,
                });
            }
        } else if self.sync.push_new_branches && !perennial {
            program.append(Opcode::CreateTrackingBranch {
                branch: name.to_string(),
                remote: remote.to_string(),
                no_push_hook,
            });
        }
    }

    /// Append sync opcodes for several branches, ancestors before descendants.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::LineageCycle` if the lineage loops.
    pub fn branches_program(
        &self,
        branches: &[BranchInfo],
        push: bool,
        program: &mut Program,
    ) -> ArborResult<()> {
        let names: Vec<String> = branches.iter().map(|b| b.name.clone()).collect();
        for name in self.lineage.order_root_first(&names)? {
            if let Some(branch) = branches.iter().find(|b| b.name == name) {
                self.branch_program(branch, push, program);
            }
        }
        Ok(())
    }
}

fn reconcile(strategy: SyncStrategy, branch: String) -> Opcode {
    match strategy {
        SyncStrategy::Merge => Opcode::Merge { branch },
        SyncStrategy::Rebase => Opcode::Rebase { branch },
    }
}

// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Branch lineage: the parent of every feature branch.
//!
//! ```text
//! git config                            Lineage
//!   arbor-branch.login.parent  main  -->  main
//!   arbor-branch.oauth.parent  login       '-- login
//!   arbor-branch.docs.parent   main              '-- oauth
//!                                          '-- docs
//! ```
//!
//! Main and perennial branches are roots and never have a parent. Entries are
//! written by the `SetParent`/`RemoveParent` opcodes, never directly.


use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::config::types::BranchesConfig;
use crate::error::{ArborResult, GitResult, ValidationError};
use crate::git::backend::GitQuery;

/// Pattern passed to `git config --get-regexp`.
pub const PARENT_KEY_PATTERN: &str = r"^arbor-branch\..*\.parent$";

static PARENT_KEY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^arbor-branch\.(.+)\.parent$").ok());

/// Git config key holding the parent of `branch`.
#[must_use]
pub fn parent_key(branch: &str) -> String {
    format!("arbor-branch.{branch}.parent")
}

/// Parent relation between branches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineage {
    parents: BTreeMap<String, String>,
}

impl Lineage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every parent entry from git config.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if git config cannot be read.
    pub fn load(query: &dyn GitQuery) -> GitResult<Self> {
        Ok(Self::from_config_entries(
            query.config_entries(PARENT_KEY_PATTERN)?,
        ))
    }

    /// Build from `(key, value)` config entries, ignoring unrelated keys.
    #[must_use]
    pub fn from_config_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut lineage = Self::new();
        let Some(pattern) = PARENT_KEY.as_ref() else {
            return lineage;
        };
        for (key, value) in entries {
            if let Some(captures) = pattern.captures(&key)
                && !value.is_empty()
            {
                lineage.set_parent(&captures[1], &value);
            }
        }
        lineage
    }

    pub fn set_parent(&mut self, branch: &str, parent: &str) {
        self.parents.insert(branch.to_string(), parent.to_string());
    }

    #[must_use]
    pub fn parent(&self, branch: &str) -> Option<&str> {
        self.parents.get(branch).map(String::as_str)
    }

    /// Direct children, sorted by name.
    #[must_use]
    pub fn children(&self, branch: &str) -> Vec<String> {
        self.parents
            .iter()
            .filter(|(_, parent)| parent.as_str() == branch)
            .map(|(child, _)| child.clone())
            .collect()
    }

    /// Ancestors of `branch`, oldest first, excluding the branch itself.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::LineageCycle` if the parent chain loops.
    pub fn ancestors(&self, branch: &str) -> ArborResult<Vec<String>> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::from([branch]);
        let mut current = branch;
        while let Some(parent) = self.parent(current) {
            if !seen.insert(parent) {
                return Err(ValidationError::LineageCycle {
                    branch: branch.to_string(),
                }
                .into());
            }
            chain.push(parent.to_string());
            current = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Ancestors followed by `branch` itself.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::LineageCycle` if the parent chain loops.
    pub fn branch_and_ancestors(&self, branch: &str) -> ArborResult<Vec<String>> {
        let mut chain = self.ancestors(branch)?;
        chain.push(branch.to_string());
        Ok(chain)
    }

    /// Whether `candidate` sits anywhere below `branch`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::LineageCycle` if the parent chain loops.
    pub fn is_descendant(&self, candidate: &str, branch: &str) -> ArborResult<bool> {
        Ok(self.ancestors(candidate)?.iter().any(|a| a == branch))
    }

    /// Order branches so every parent comes before its children.
    ///
    /// Depth first, then name, so the result is deterministic.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::LineageCycle` if any parent chain loops.
    pub fn order_root_first(&self, branches: &[String]) -> ArborResult<Vec<String>> {
        let mut keyed = branches
            .iter()
            .map(|branch| Ok((self.ancestors(branch)?.len(), branch.clone())))
            .collect::<ArborResult<Vec<_>>>()?;
        keyed.sort();
        keyed.dedup();
        Ok(keyed.into_iter().map(|(_, branch)| branch).collect())
    }

    /// Fail unless every feature branch in `branches` has a known parent.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownAncestry` for the first feature branch
    /// without a parent.
    pub fn ensure_known(&self, branches: &[String], roles: &BranchesConfig) -> ArborResult<()> {
        for branch in branches {
            if roles.is_feature(branch) && self.parent(branch).is_none() {
                return Err(ValidationError::UnknownAncestry {
                    branch: branch.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

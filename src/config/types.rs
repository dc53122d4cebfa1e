// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types.
//!
//! ```text
//! Config: GlobalConfig, BranchesConfig, SyncConfig, ShipConfig
//! SyncStrategy: Merge (feature default) | Rebase (perennial default)
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// How a branch is reconciled with its tracking branch or parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    /// Merge the other branch in.
    Merge,
    /// Rebase onto the other branch.
    Rebase,
}

impl std::fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

impl std::str::FromStr for SyncStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "rebase" => Ok(Self::Rebase),
            _ => Err(ConfigError::InvalidValue {
                section: "sync".to_string(),
                key: "strategy".to_string(),
                message: format!("expected 'merge' or 'rebase', got '{s}'"),
            }),
        }
    }
}

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Print the git commands without running mutating ones.
    pub dry: bool,
    /// Log level for console output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file, no file logging when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            dry: false,
            output_log_level: LogLevel::WARN,
            file_log_level: LogLevel::DEBUG,
            log_file: None,
        }
    }
}

/// Branch roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BranchesConfig {
    /// The main development branch, root of every lineage tree.
    pub main: String,
    /// Long-lived branches that are never shipped and have no parent.
    pub perennials: Vec<String>,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        Self {
            main: "main".to_string(),
            perennials: Vec::new(),
        }
    }
}

impl BranchesConfig {
    /// Main or one of the perennial branches.
    #[must_use]
    pub fn is_perennial(&self, branch: &str) -> bool {
        branch == self.main || self.perennials.iter().any(|p| p == branch)
    }

    /// Any branch that is neither main nor perennial.
    #[must_use]
    pub fn is_feature(&self, branch: &str) -> bool {
        !self.is_perennial(branch)
    }
}

/// Sync behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Strategy for feature branches (tracking branch and parent).
    pub strategy: SyncStrategy,
    /// Strategy for main and perennial branches against their tracking branch.
    pub perennial_strategy: SyncStrategy,
    /// Push branches after syncing them.
    pub push_branches: bool,
    /// Create a tracking branch for newly created branches.
    pub push_new_branches: bool,
    /// Run git pre-push hooks (`false` passes `--no-verify`).
    pub push_hook: bool,
    /// Skip every remote-touching step.
    pub offline: bool,
    /// Name of the remote to sync with.
    pub remote: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: SyncStrategy::Merge,
            perennial_strategy: SyncStrategy::Rebase,
            push_branches: true,
            push_new_branches: false,
            push_hook: true,
            offline: false,
            remote: "origin".to_string(),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub const fn is_online(&self) -> bool {
        !self.offline
    }
}

/// Ship behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShipConfig {
    /// Delete the shipped branch's tracking branch. Turn off when the
    /// hosting service deletes merged head branches itself.
    pub delete_tracking_branch: bool,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            delete_tracking_branch: true,
        }
    }
}

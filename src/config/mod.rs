// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. <repo root>/arbor.toml
//! 3. --config FILE (repeatable)
//! 4. ARBOR_* env vars
//! 5. --set section.key=value
//! 6. CLI flags (--dry-run, --offline)
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! ARBOR_SYNC__STRATEGY=rebase      → sync.strategy = "rebase"
//! ARBOR_SYNC__OFFLINE=true         → sync.offline = true
//! ARBOR_BRANCHES__PERENNIALS=a,b   → branches.perennials = ["a", "b"]
//! ```
//!
//! Branch lineage is not part of this file. It lives in git config and is
//! owned by [`crate::lineage`].

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, Result};

use loader::ConfigLoader;
use types::{BranchesConfig, GlobalConfig, ShipConfig, SyncConfig};

/// File name looked up in the repository root.
pub const CONFIG_FILE_NAME: &str = "arbor.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ARBOR";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Main and perennial branches.
    pub branches: BranchesConfig,
    /// Sync strategy and push policy.
    pub sync: SyncConfig,
    /// Ship options.
    pub ship: ShipConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use arbor::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("arbor.toml")
    ///     .with_env_prefix("ARBOR")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Check cross-field constraints the types cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an empty main branch or remote
    /// name, or when the main branch is also listed as perennial.
    pub fn validate(&self) -> Result<()> {
        if self.branches.main.trim().is_empty() {
            return Err(invalid("branches", "main", "must not be empty").into());
        }
        if self.sync.remote.trim().is_empty() {
            return Err(invalid("sync", "remote", "must not be empty").into());
        }
        if self.branches.perennials.contains(&self.branches.main) {
            return Err(invalid(
                "branches",
                "perennials",
                &format!("'{}' is the main branch", self.branches.main),
            )
            .into());
        }
        Ok(())
    }

    /// Format configuration options for display, deterministically ordered.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        options.insert("global.dry", self.global.dry.to_string());
        options.insert(
            "global.output_log_level",
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level",
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file",
            self.global
                .log_file
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
        options.insert("branches.main", self.branches.main.clone());
        options.insert("branches.perennials", self.branches.perennials.join(", "));
        options.insert("sync.strategy", self.sync.strategy.to_string());
        options.insert(
            "sync.perennial_strategy",
            self.sync.perennial_strategy.to_string(),
        );
        options.insert("sync.push_branches", self.sync.push_branches.to_string());
        options.insert(
            "sync.push_new_branches",
            self.sync.push_new_branches.to_string(),
        );
        options.insert("sync.push_hook", self.sync.push_hook.to_string());
        options.insert("sync.offline", self.sync.offline.to_string());
        options.insert("sync.remote", self.sync.remote.clone());
        options.insert(
            "ship.delete_tracking_branch",
            self.ship.delete_tracking_branch.to_string(),
        );

        let width = options.keys().map(|k| k.len()).max().unwrap_or(0);
        options
            .into_iter()
            .map(|(key, value)| format!("{key:width$} = {value}"))
            .collect()
    }
}

fn invalid(section: &str, key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}

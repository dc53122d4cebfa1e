// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Global CLI options available for all commands.
//!
//! # Option Precedence
//!
//! ```text
//! --config FILE       ← Additional config files (can repeat)
//! --dry-run           ← Print git commands, change nothing
//! --offline           ← Skip fetch, push and remote reconciliation
//! --log-level N       ← Console verbosity (0-6)
//! --file-log-level N  ← File verbosity (overrides --log-level)
//! --set KEY=VAL       ← Direct config override
//! --on-unfinished R   ← Answer for the resume dialog
//!
//! Precedence: CLI flags > --set > env > --config > arbor.toml > defaults
//! ```

use clap::Args;
use std::path::PathBuf;

/// Global options available for all commands.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalOptions {
    /// Additional TOML configuration file(s), loaded after `arbor.toml`.
    /// Can be specified multiple times.
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true, action = clap::ArgAction::Append)]
    pub configs: Vec<PathBuf>,

    /// Print the git commands a workflow would run without running them.
    #[arg(long = "dry-run", global = true)]
    pub dry_run: bool,

    /// Do not touch the remote.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Console log level (0=silent, 1=errors, 2=warnings, 3=info, 4=debug, 5=trace, 6=dump).
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", global = true, value_parser = clap::value_parser!(u8).range(0..=6)
    )]
    pub log_level: Option<u8>,

    /// File log level, overrides --log-level for the log file.
    #[arg(long = "file-log-level", value_name = "LEVEL", global = true, value_parser = clap::value_parser!(u8).range(0..=6)
    )]
    pub file_log_level: Option<u8>,

    /// Path to log file.
    #[arg(long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Sets an option, such as 'sync.strategy=rebase'.
    /// Can be specified multiple times.
    #[arg(short = 's', long = "set", value_name = "OPTION", global = true, action = clap::ArgAction::Append)]
    pub options: Vec<String>,

    /// Answer the unfinished-command dialog without asking:
    /// continue, skip, undo, discard or quit.
    #[arg(long = "on-unfinished", value_name = "RESPONSE", global = true)]
    pub on_unfinished: Option<String>,
}

impl GlobalOptions {
    /// Converts command-line options to configuration overrides.
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<String> {
        let mut overrides = self.options.clone();

        if let Some(level) = self.log_level {
            overrides.push(format!("global.output_log_level={level}"));
        }

        // file_log_level falls back to log_level if not specified
        if let Some(level) = self.file_log_level.or(self.log_level) {
            overrides.push(format!("global.file_log_level={level}"));
        }

        if let Some(ref path) = self.log_file {
            overrides.push(format!("global.log_file={}", path.display()));
        }

        if self.dry_run {
            overrides.push("global.dry=true".to_string());
        }

        if self.offline {
            overrides.push("sync.offline=true".to_string());
        }

        overrides
    }
}

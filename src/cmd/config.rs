// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `config`: show the effective options.

use crate::config::Config;

/// Display current configuration options followed by the files they came from.
pub fn run_config_command(config: &Config, config_files: &[String]) {
    for line in config.format_options() {
        println!("{line}");
    }
    println!();
    if config_files.is_empty() {
        println!("No configuration files loaded");
    } else {
        for line in config_files {
            println!("{line}");
        }
    }
}

// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (workflows)
//!                            append / hack / sync / ship
//!                            rename-branch / set-parent
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |          config           |
//!              |   TOML, layered settings  |
//!              '--+-----------+--------+---'
//!                 |           |        |
//!                 v           v        v
//!               sync       lineage   hosting
//!             planner     parents    connector
//!                 |
//!                 v
//!     +---------------------------------------+
//!     | vm   opcode, program, runstate,       |
//!     |      interpreter, statefile, resume   |
//!     +---------------------------------------+
//!     | git  runner/query backend, commands   |
//!     +---------------------------------------+
//!     | foundation   error, logging           |
//!     +---------------------------------------+
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod git;
pub mod hosting;
pub mod lineage;
pub mod logging;
pub mod sync;
pub mod vm;

#[cfg(test)]
pub mod test_utils;

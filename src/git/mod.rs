// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git access.
//!
//! ```text
//!   discovery.rs        cmd.rs
//!   (gix, locate)   (mutating commands)
//!                         |
//!                         v
//!      ,--------------------------------,
//!      |        backend (traits)        |
//!      '--+-------------------------+---'
//!         |                         |
//!         v                         v
//!     GitQuery                   Runner
//!    (read-only)          (execution capability)
//!         |                    |         |
//!         v                    v         v
//!     ShellBackend      ShellBackend   PrintOnly
//!                                      (dry run)
//! ```

pub mod backend;
pub mod cmd;
pub mod discovery;

#[cfg(test)]
mod tests;

// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resumable execution of git workflows.
//!
//! ```text
//!   workflow (cmd)
//!        |  builds
//!        v
//!   Program ---- wrap() ----> Program
//!        |
//!        v
//!   RunState ---> interpreter::execute ---> Outcome
//!        ^                 |
//!        |                 | halt
//!        |                 v
//!        +---------- StateFile (<git dir>/arbor/runstate.json)
//!                          |
//!                          v
//!                 resume: continue / skip / undo / discard / quit
//! ```

pub mod interpreter;
pub mod opcode;
pub mod program;
pub mod resume;
pub mod runstate;
pub mod statefile;

pub use interpreter::{Machine, Outcome, execute};
pub use opcode::Opcode;
pub use program::{Program, WrapOptions};
pub use runstate::RunState;
pub use statefile::StateFile;

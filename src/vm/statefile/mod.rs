// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persisted run state, one file per repository.
//!
//! ```text
//! <git dir>/arbor/runstate.json
//!
//! load()   --> Absent | Finished(RunState) | Unfinished(RunState)
//! save()   --> write temp file in the same directory, rename over
//! delete() --> remove, absent is fine
//! ```
//!
//! Living under the git directory keeps the file out of the work tree and
//! gives every linked worktree its own checkpoint.


use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::runstate::RunState;
use crate::error::{ArborResult, ProtocolError, StateError};
use crate::git::discovery::RepoPaths;

/// Directory under the git dir holding arbor's files.
pub const STATE_DIR: &str = "arbor";

/// File name of the persisted run state.
pub const STATE_FILE: &str = "runstate.json";

/// Result of loading the persisted run state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedState {
    Absent,
    /// Present without unfinished details: a stale leftover.
    Finished(RunState),
    /// Present and halted.
    Unfinished(RunState),
}

/// Handle on the persisted run state of one repository.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    #[must_use]
    pub fn for_repo(paths: &RepoPaths) -> Self {
        Self::at(paths.git_dir.join(STATE_DIR).join(STATE_FILE))
    }

    #[must_use]
    pub const fn at(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// Returns `StateError::Read` if the file exists but cannot be read and
    /// `ProtocolError::CorruptState` if it cannot be parsed. A corrupt file is
    /// left in place.
    pub fn load(&self) -> ArborResult<LoadedState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LoadedState::Absent),
            Err(source) => {
                return Err(StateError::Read {
                    path: self.path.display().to_string(),
                    source,
                }
                .into());
            }
        };
        let state: RunState =
            serde_json::from_str(&content).map_err(|e| ProtocolError::CorruptState {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        debug!(path = %self.path.display(), command = %state.command, "loaded run state");
        Ok(if state.is_unfinished() {
            LoadedState::Unfinished(state)
        } else {
            LoadedState::Finished(state)
        })
    }

    /// Overwrite the persisted state atomically.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the state cannot be serialized or written.
    pub fn save(&self, state: &RunState) -> ArborResult<()> {
        let json = serde_json::to_string_pretty(state).map_err(StateError::from)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let write_err = |source: std::io::Error| StateError::Write {
            path: self.path.display().to_string(),
            source,
        };
        std::fs::create_dir_all(dir).map_err(write_err)?;
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(json.as_bytes()).map_err(write_err)?;
        temp.write_all(b"\n").map_err(write_err)?;
        temp.persist(&self.path).map_err(|e| write_err(e.error))?;
        debug!(path = %self.path.display(), "saved run state");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StateError::Write` if an existing file cannot be removed.
    pub fn delete(&self) -> ArborResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "deleted run state");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StateError::Write {
                path: self.path.display().to_string(),
                source,
            }
            .into()),
        }
    }
}

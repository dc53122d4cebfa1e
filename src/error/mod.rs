// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!              ArborError (~24 bytes)
//!                     |
//!   +-------+------+--+----+-------+-------+
//!   |       |      |       |       |       |
//!   v       v      v       v       v       v
//! Valid    Git   Config  State  Protocol  Io/Other
//!  Box     Box    Box     Box     Box     Box<str>
//!
//! Sub-errors (unboxed internally):
//!   Validation  BranchExists*, UnknownAncestry, NotShippable, ...
//!   Git         CommandFailed, Conflict, Gix, RepoNotFound
//!   Config      ParseError, InvalidValue
//!   State       Read, Write
//!   Protocol    UnexpectedResponse, CorruptState
//!
//! Opcode failures:  OperationError { Conflict | Failed }
//! ```
//!
//! The exit code contract lives here too: see [`ExitClass`].

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`ArborError`].
pub type ArborResult<T> = std::result::Result<T, ArborError>;

/// Result type for raw git invocations.
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum ArborError {
    /// Pre-flight check rejected the requested workflow. Nothing ran.
    #[error(transparent)]
    Validation(#[from] Box<ValidationError>),

    /// Git operation failed.
    #[error("git error: {0}")]
    Git(#[from] Box<GitError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Reading or writing the persisted run state failed.
    #[error("run state error: {0}")]
    State(#[from] Box<StateError>),

    /// Unexpected dialog answer or unreadable run state.
    #[error("protocol error: {0}")]
    Protocol(#[from] Box<ProtocolError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for ArborError {
                fn from(err: $error) -> Self {
                    ArborError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    ValidationError => Validation,
    GitError => Git,
    ConfigError => Config,
    StateError => State,
    ProtocolError => Protocol,
    std::io::Error => Io,
}

// --- Gix Errors ---

/// Wrapper for gix-specific errors.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to discover repository from path.
    #[error("failed to discover repository: {0}")]
    Discover(#[from] Box<gix::discover::Error>),

    /// Failed to get HEAD reference.
    #[error("failed to get head reference: {0}")]
    Head(#[from] gix::reference::find::existing::Error),

    /// Repository has no worktree (bare repository).
    #[error("repository has no worktree (bare repository)")]
    BareRepository,
}

// --- Git Errors ---

/// Git operation errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found at the specified path.
    #[error("repository not found: {path}")]
    RepoNotFound { path: String },

    /// The `git` executable is not on PATH.
    #[error("git executable not found in PATH")]
    GitNotFound,

    /// Git command execution failed.
    #[error("git command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    /// Git stopped with unresolved conflicts in the working tree.
    #[error("{command} stopped with conflicts - {message}")]
    Conflict { command: String, message: String },

    /// Error from gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),
}

impl GitError {
    /// Whether git reported unresolved content conflicts.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration sources.
    #[error("failed to parse config: {message}")]
    ParseError { message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    /// Malformed `--set key=value` override.
    #[error("invalid override '{0}', expected key=value")]
    InvalidOverride(String),
}

// --- Validation Errors ---

/// Pre-flight rejections. Raised before any opcode runs, never persisted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A local branch with this name already exists.
    #[error("there is already a branch \"{branch}\"")]
    BranchExistsLocally { branch: String },

    /// A branch with this name exists on the remote.
    #[error("there is already a branch \"{branch}\" at the \"{remote}\" remote")]
    BranchExistsRemotely { branch: String, remote: String },

    /// The named branch does not exist.
    #[error("there is no branch \"{branch}\"")]
    NoSuchBranch { branch: String },

    /// HEAD is detached so there is no current branch to work from.
    #[error("no branch is checked out")]
    DetachedHead,

    /// The branch has no recorded parent and is not main or perennial.
    #[error("the parent of branch \"{branch}\" is unknown, run \"arbor set-parent <parent> --branch {branch}\"")]
    UnknownAncestry { branch: String },

    /// Parent entries form a loop.
    #[error("branch \"{branch}\" is its own ancestor")]
    LineageCycle { branch: String },

    /// Only feature branches can be shipped or renamed.
    #[error("the branch \"{branch}\" is not a feature branch, only feature branches can be {action}")]
    NotAFeatureBranch { branch: String, action: String },

    /// Shipping would also ship unshipped ancestors.
    #[error("shipping this branch would ship {ancestors} as well, please ship \"{oldest}\" first")]
    NestedShip { ancestors: String, oldest: String },

    /// Uncommitted changes block the workflow.
    #[error("you have uncommitted changes, did you mean to commit them before {action}?")]
    OpenChanges { action: String },

    /// A proposal merge was requested but no hosting connector is configured.
    #[error("cannot merge proposal #{number} for \"{branch}\": no hosting connector is configured")]
    NoConnector { branch: String, number: u64 },

    /// The requested parent would make the branch its own ancestor.
    #[error("cannot make \"{parent}\" the parent of \"{branch}\": it is a descendant of \"{branch}\"")]
    ParentIsDescendant { branch: String, parent: String },

    /// Continue was requested while conflicts remain.
    #[error("you must resolve the conflicts before continuing")]
    UnresolvedConflicts,

    /// Skip was requested for an opcode that cannot be skipped.
    #[error("the \"{command}\" command cannot skip the current step")]
    CannotSkip { command: String },

    /// No unfinished run state exists.
    #[error("nothing to {action}, there is no unfinished command")]
    NothingToResume { action: String },
}

// --- State Errors ---

/// Persisted run-state I/O errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// Failed to read the state file.
    #[error("failed to read run state '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write or delete the state file.
    #[error("failed to write run state '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the run state.
    #[error("failed to serialize run state: {0}")]
    Serialize(#[from] serde_json::Error),
}

// --- Protocol Errors ---

/// Fatal errors. Persisted state is left untouched for inspection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The resume dialog answered with something other than the known responses.
    #[error("unexpected response from resume dialog: \"{0}\"")]
    UnexpectedResponse(String),

    /// The resume dialog could not be asked.
    #[error("resume dialog failed: {0}")]
    DialogFailed(#[source] std::io::Error),

    /// The persisted run state cannot be parsed.
    #[error("run state '{path}' is corrupt: {message}")]
    CorruptState { path: String, message: String },
}

// --- Operation Errors ---

/// Failure of a single opcode's `run`.
///
/// Conflict-class failures are expected halts that a human resolves; everything
/// else still halts but can never be skipped.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Git stopped with unresolved content conflicts.
    #[error(transparent)]
    Conflict(GitError),

    /// Any other failure (network, permissions, unexpected output).
    #[error(transparent)]
    Failed(ArborError),
}

impl OperationError {
    /// Whether this failure is conflict-class.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Build a non-conflict failure from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(ArborError::Other(message.into().into_boxed_str()))
    }
}

impl From<GitError> for OperationError {
    fn from(err: GitError) -> Self {
        if err.is_conflict() {
            Self::Conflict(err)
        } else {
            Self::Failed(err.into())
        }
    }
}

impl From<ArborError> for OperationError {
    fn from(err: ArborError) -> Self {
        Self::Failed(err)
    }
}

// --- Exit classification ---

/// How a command ended, as seen by the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    /// Workflow completed.
    Success,
    /// Pre-flight rejection or ordinary failure.
    Failure,
    /// Fatal protocol error, state left for inspection.
    Fatal,
    /// Execution halted, resumable with continue/skip/undo.
    Halted,
}

impl ExitClass {
    /// Halted runs use `EX_TEMPFAIL` so scripts can tell them apart.
    pub const HALTED_CODE: u8 = 75;
    /// Protocol errors use `EX_SOFTWARE`.
    pub const FATAL_CODE: u8 = 70;

    /// Classify an error returned from a workflow command.
    #[must_use]
    pub fn of_error(err: &anyhow::Error) -> Self {
        let is_protocol = err.chain().any(|cause| {
            cause.downcast_ref::<ProtocolError>().is_some()
                || matches!(
                    cause.downcast_ref::<ArborError>(),
                    Some(ArborError::Protocol(_))
                )
        });
        if is_protocol { Self::Fatal } else { Self::Failure }
    }

    /// Process exit code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Fatal => Self::FATAL_CODE,
            Self::Halted => Self::HALTED_CODE,
        }
    }
}

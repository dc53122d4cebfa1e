// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git backend abstraction layer.
//!
//! ```text
//! Runner   (execute, may mutate) --> ShellBackend (git CLI)
//!                                --> PrintOnly    (dry run, announces only)
//! GitQuery (read-only)           --> ShellBackend (git CLI)
//! ```
//!
//! `Runner` is the execution capability opcodes act through. Failures that
//! leave unresolved conflicts come back as [`GitError::Conflict`]; everything
//! else is [`GitError::CommandFailed`].

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::LazyLock;
use tracing::trace;

use crate::error::{GitError, GitResult};

/// Output markers git prints when it stops on conflicts.
static CONFLICT_MARKERS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^CONFLICT \(|Merge conflict in |could not apply |You have unmerged paths|needs merge|fix conflicts and then|Resolve all conflicts manually",
    )
    .ok()
});

/// Whether git's combined output reports content conflicts.
#[must_use]
pub fn reports_conflict(output: &str) -> bool {
    CONFLICT_MARKERS
        .as_ref()
        .is_some_and(|regex| regex.is_match(output))
}

// --- Runner Trait (execution capability) ---

/// Runs a git operation against a working tree.
pub trait Runner {
    /// Run `git <args>` in `cwd`, returning trimmed stdout.
    ///
    /// # Errors
    ///
    /// Returns `GitError::Conflict` when git stopped on unresolved conflicts,
    /// `GitError::CommandFailed` for every other non-zero exit.
    fn run(&self, cwd: &Path, args: &[&str]) -> GitResult<String>;
}

// --- Query Trait (Read-only operations) ---

/// Working tree state relevant to halting and resuming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoStatus {
    /// Uncommitted changes, staged or not, including untracked files.
    pub open_changes: bool,
    /// Unmerged index entries.
    pub conflicts: bool,
    /// `MERGE_HEAD` exists.
    pub merge_in_progress: bool,
    /// A rebase is paused.
    pub rebase_in_progress: bool,
}

impl RepoStatus {
    /// Whether a paused merge or rebase still needs a human.
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        self.conflicts || self.merge_in_progress || self.rebase_in_progress
    }
}

/// Read-only git queries.
pub trait GitQuery {
    /// Current branch name (None if HEAD is detached).
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if git cannot be run.
    fn current_branch(&self) -> GitResult<Option<String>>;

    /// Branch checked out before the current one (`@{-1}`).
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if git cannot be run.
    fn previously_checked_out_branch(&self) -> GitResult<Option<String>>;

    /// Full sha of a revision, None if it does not resolve.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if git cannot be run.
    fn sha_of(&self, rev: &str) -> GitResult<Option<String>>;

    /// All local branch names, sorted.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the branch listing fails.
    fn local_branches(&self) -> GitResult<Vec<String>>;

    /// Configured remote names.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the remote listing fails.
    fn remotes(&self) -> GitResult<Vec<String>>;

    /// Working tree status.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the status check fails.
    fn status(&self) -> GitResult<RepoStatus>;

    /// Files that differ between two revisions.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the diff fails.
    fn changed_files(&self, from: &str, to: &str) -> GitResult<Vec<String>>;

    /// Git config entries whose key matches `pattern`, as `(key, value)`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if git config cannot be read.
    fn config_entries(&self, pattern: &str) -> GitResult<Vec<(String, String)>>;

    /// Stash subjects, newest first.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the stash cannot be listed.
    fn stash_entries(&self) -> GitResult<Vec<String>>;

    /// Whether a local branch exists.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if git cannot be run.
    fn has_local_branch(&self, branch: &str) -> GitResult<bool> {
        Ok(self.sha_of(&format!("refs/heads/{branch}"))?.is_some())
    }

    /// Whether `<remote>/<branch>` exists locally (as of the last fetch).
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if git cannot be run.
    fn has_remote_branch(&self, remote: &str, branch: &str) -> GitResult<bool> {
        Ok(self
            .sha_of(&format!("refs/remotes/{remote}/{branch}"))?
            .is_some())
    }
}

// --- ShellBackend Implementation (Git CLI) ---

/// Shell-based git backend using the git CLI.
pub struct ShellBackend {
    root: PathBuf,
    git: PathBuf,
    print_commands: bool,
}

impl ShellBackend {
    /// Create a backend rooted at the repository work tree.
    ///
    /// # Errors
    ///
    /// Returns `GitError::GitNotFound` if no `git` executable is on PATH.
    pub fn new(root: impl Into<PathBuf>) -> GitResult<Self> {
        let git = which::which("git").map_err(|_| GitError::GitNotFound)?;
        Ok(Self {
            root: root.into(),
            git,
            print_commands: false,
        })
    }

    /// Echo every mutating command to stdout before running it.
    #[must_use]
    pub const fn with_print_commands(mut self, enable: bool) -> Self {
        self.print_commands = enable;
        self
    }

    /// Repository root this backend queries.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run git without interpreting the exit status.
    /// Sets `GCM_INTERACTIVE=never` and `GIT_TERMINAL_PROMPT=0`.
    fn exec(&self, cwd: &Path, args: &[&str]) -> GitResult<Output> {
        let output = Command::new(&self.git)
            .args(args)
            .current_dir(cwd)
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| GitError::CommandFailed {
                command: format_command(args),
                message: format!("failed to execute git: {e}"),
            })?;
        trace!(
            command = %format_command(args),
            status = ?output.status.code(),
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git"
        );
        Ok(output)
    }

    /// Run a read-only command in the root. Non-zero exit means "absent".
    fn probe(&self, args: &[&str]) -> GitResult<Option<String>> {
        let output = self.exec(&self.root, args)?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
        } else {
            Ok(None)
        }
    }

    /// Run a read-only command in the root that must succeed.
    fn query(&self, args: &[&str]) -> GitResult<String> {
        self.run_quiet(&self.root, args)
    }

    fn run_quiet(&self, cwd: &Path, args: &[&str]) -> GitResult<String> {
        let output = self.exec(cwd, args)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() {
            return Ok(stdout.trim().to_string());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{}\n{}", stdout.trim(), stderr.trim());
        let command = format_command(args);
        let message = combined.trim().to_string();
        if reports_conflict(&combined) {
            Err(GitError::Conflict { command, message })
        } else {
            Err(GitError::CommandFailed { command, message })
        }
    }

    /// Whether a `--git-path` location exists (rebase state directories).
    fn git_path_exists(&self, name: &str) -> GitResult<bool> {
        let path = self.query(&["rev-parse", "--git-path", name])?;
        Ok(self.root.join(path).exists())
    }
}

impl Runner for ShellBackend {
    fn run(&self, cwd: &Path, args: &[&str]) -> GitResult<String> {
        if self.print_commands {
            println!("[{}] {}", current_label(self, cwd), format_command(args));
        }
        self.run_quiet(cwd, args)
    }
}

impl GitQuery for ShellBackend {
    fn current_branch(&self) -> GitResult<Option<String>> {
        self.probe(&["symbolic-ref", "--quiet", "--short", "HEAD"])
    }

    fn previously_checked_out_branch(&self) -> GitResult<Option<String>> {
        let previous = self.probe(&["rev-parse", "--verify", "--quiet", "--abbrev-ref", "@{-1}"])?;
        Ok(previous.filter(|name| !name.is_empty()))
    }

    fn sha_of(&self, rev: &str) -> GitResult<Option<String>> {
        let spec = format!("{rev}^{{commit}}");
        self.probe(&["rev-parse", "--verify", "--quiet", &spec])
    }

    fn local_branches(&self) -> GitResult<Vec<String>> {
        let output = self.query(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
        Ok(parse_lines(&output))
    }

    fn remotes(&self) -> GitResult<Vec<String>> {
        let output = self.query(&["remote"])?;
        Ok(parse_lines(&output))
    }

    fn status(&self) -> GitResult<RepoStatus> {
        let porcelain = self.query(&["status", "--porcelain", "--untracked-files=all"])?;
        let mut status = parse_porcelain(&porcelain);
        status.merge_in_progress = self
            .probe(&["rev-parse", "--verify", "--quiet", "MERGE_HEAD"])?
            .is_some();
        status.rebase_in_progress =
            self.git_path_exists("rebase-merge")? || self.git_path_exists("rebase-apply")?;
        Ok(status)
    }

    fn changed_files(&self, from: &str, to: &str) -> GitResult<Vec<String>> {
        let output = self.query(&["diff", "--name-only", from, to])?;
        Ok(parse_lines(&output))
    }

    fn config_entries(&self, pattern: &str) -> GitResult<Vec<(String, String)>> {
        // exit code 1 means no matching keys
        let output = self
            .probe(&["config", "--get-regexp", pattern])?
            .unwrap_or_default();
        Ok(output
            .lines()
            .filter_map(|line| {
                let (key, value) = line.split_once(char::is_whitespace)?;
                Some((key.to_string(), value.trim().to_string()))
            })
            .collect())
    }

    fn stash_entries(&self) -> GitResult<Vec<String>> {
        let output = self.query(&["stash", "list", "--format=%gs"])?;
        Ok(parse_lines(&output))
    }
}

fn current_label(backend: &ShellBackend, cwd: &Path) -> String {
    backend
        .current_branch()
        .ok()
        .flatten()
        .unwrap_or_else(|| cwd.display().to_string())
}

// --- PrintOnly (dry run) ---

/// Dry-run runner: announces each command and never executes it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintOnly;

impl Runner for PrintOnly {
    fn run(&self, _cwd: &Path, args: &[&str]) -> GitResult<String> {
        println!("(dry run) {}", format_command(args));
        Ok(String::new())
    }
}

// --- Parsing helpers ---

/// Render a git invocation for logs and errors.
#[must_use]
pub fn format_command(args: &[&str]) -> String {
    let mut rendered = String::from("git");
    for arg in args {
        rendered.push(' ');
        if arg.contains(char::is_whitespace) {
            rendered.push('"');
            rendered.push_str(arg);
            rendered.push('"');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}

/// Non-empty trimmed lines.
#[must_use]
pub fn parse_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse `git status --porcelain` (v1) output.
///
/// Unmerged entries are `DD AU UD UA DU AA UU`.
#[must_use]
pub fn parse_porcelain(output: &str) -> RepoStatus {
    let mut status = RepoStatus::default();
    for line in output.lines().filter(|line| line.len() >= 2) {
        status.open_changes = true;
        if matches!(&line[..2], "DD" | "AU" | "UD" | "UA" | "DU" | "AA" | "UU") {
            status.conflicts = true;
        }
    }
    status
}

#[cfg(test)]
mod tests;

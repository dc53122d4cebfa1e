// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory repository double for unit tests.
//!
//! `FakeRepo` implements both [`Runner`] and [`GitQuery`] by simulating the
//! handful of git commands the opcodes issue. Every `Runner` call is recorded
//! so tests can assert on the exact command sequence, and failures can be
//! scripted by command prefix.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{GitError, GitResult};
use crate::git::backend::{GitQuery, RepoStatus, Runner, format_command};

/// What a scripted failure looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The command stops with conflicts, leaving a paused merge/rebase.
    Conflict,
    /// The command fails without touching the work tree.
    Other,
}

#[derive(Debug, Clone)]
struct Failure {
    prefix: String,
    kind: FailureKind,
}

#[derive(Debug, Default)]
struct State {
    branches: BTreeMap<String, String>,
    remote_branches: BTreeMap<String, String>,
    remotes: Vec<String>,
    current: Option<String>,
    previous: Option<String>,
    config: BTreeMap<String, String>,
    stash: Vec<String>,
    open_changes: bool,
    conflicts: bool,
    merge_in_progress: bool,
    rebase_in_progress: bool,
    failures: Vec<Failure>,
    calls: Vec<String>,
    next_sha: u32,
}

impl State {
    fn new_sha(&mut self) -> String {
        self.next_sha += 1;
        format!("sha{}", self.next_sha)
    }

    fn resolve(&self, rev: &str) -> Option<String> {
        if let Some(name) = rev.strip_prefix("refs/heads/") {
            return self.branches.get(name).cloned();
        }
        if let Some(name) = rev.strip_prefix("refs/remotes/") {
            return self.remote_branches.get(name).cloned();
        }
        if rev == "HEAD" {
            return self
                .current
                .as_ref()
                .and_then(|b| self.branches.get(b))
                .cloned();
        }
        self.branches
            .get(rev)
            .or_else(|| self.remote_branches.get(rev))
            .cloned()
            .or_else(|| rev.starts_with("sha").then(|| rev.to_string()))
    }

    fn current(&self) -> GitResult<String> {
        self.current.clone().ok_or_else(|| failed("HEAD", "not on a branch"))
    }

    fn advance_current(&mut self) -> GitResult<()> {
        let current = self.current()?;
        let sha = self.new_sha();
        self.branches.insert(current, sha);
        Ok(())
    }
}

fn failed(command: &str, message: &str) -> GitError {
    GitError::CommandFailed {
        command: command.to_string(),
        message: message.to_string(),
    }
}

/// Scripted in-memory repository.
#[derive(Debug, Default)]
pub struct FakeRepo {
    state: RefCell<State>,
}

impl FakeRepo {
    /// Repository on `main` with an `origin` remote tracking `main`.
    pub fn new() -> Self {
        let repo = Self::default();
        {
            let mut state = repo.state.borrow_mut();
            state.branches.insert("main".to_string(), "sha0".to_string());
            state
                .remote_branches
                .insert("origin/main".to_string(), "sha0".to_string());
            state.remotes.push("origin".to_string());
            state.current = Some("main".to_string());
        }
        repo
    }

    /// Add a local branch; `tracked` also creates `origin/<branch>`.
    pub fn with_branch(self, branch: &str, parent: Option<&str>, tracked: bool) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let sha = state.new_sha();
            state.branches.insert(branch.to_string(), sha.clone());
            if tracked {
                state.remote_branches.insert(format!("origin/{branch}"), sha);
            }
            if let Some(parent) = parent {
                state
                    .config
                    .insert(format!("arbor-branch.{branch}.parent"), parent.to_string());
            }
        }
        self
    }

    /// Add `origin/<branch>` without a local branch.
    pub fn with_remote_branch(self, branch: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let sha = state.new_sha();
            state.remote_branches.insert(format!("origin/{branch}"), sha);
        }
        self
    }

    pub fn without_remote(self) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.remotes.clear();
            state.remote_branches.clear();
        }
        self
    }

    pub fn checked_out(self, branch: &str) -> Self {
        self.state.borrow_mut().current = Some(branch.to_string());
        self
    }

    pub fn with_open_changes(self) -> Self {
        self.state.borrow_mut().open_changes = true;
        self
    }

    /// Make the next command starting with `prefix` fail.
    pub fn fail_on(&self, prefix: &str, kind: FailureKind) {
        self.state.borrow_mut().failures.push(Failure {
            prefix: prefix.to_string(),
            kind,
        });
    }

    /// Mark conflicts as resolved by the user (`git add` on every file).
    pub fn resolve_conflicts(&self) {
        self.state.borrow_mut().conflicts = false;
    }

    /// Every command passed to `Runner::run`, without the `git ` prefix.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn branch_sha(&self, branch: &str) -> Option<String> {
        self.state.borrow().branches.get(branch).cloned()
    }

    pub fn has_remote(&self, name: &str) -> bool {
        self.state.borrow().remote_branches.contains_key(name)
    }

    pub fn config(&self, key: &str) -> Option<String> {
        self.state.borrow().config.get(key).cloned()
    }

    pub fn current(&self) -> Option<String> {
        self.state.borrow().current.clone()
    }

    pub fn stash_len(&self) -> usize {
        self.state.borrow().stash.len()
    }

    fn take_failure(state: &mut State, rendered: &str) -> Option<FailureKind> {
        let index = state
            .failures
            .iter()
            .position(|failure| rendered.starts_with(&failure.prefix))?;
        Some(state.failures.remove(index).kind)
    }

    fn simulate(state: &mut State, args: &[&str]) -> GitResult<()> {
        let rendered = args.join(" ");
        match args {
            ["checkout", branch] => {
                if !state.branches.contains_key(*branch) {
                    return Err(failed(&rendered, "pathspec did not match"));
                }
                state.previous = state.current.replace((*branch).to_string());
            }
            ["branch", "-D" | "-d", branch] => {
                if state.current.as_deref() == Some(*branch) {
                    return Err(failed(&rendered, "cannot delete the checked out branch"));
                }
                state
                    .branches
                    .remove(*branch)
                    .ok_or_else(|| failed(&rendered, "branch not found"))?;
            }
            ["branch", "-f", branch, sha] => {
                state.branches.insert((*branch).to_string(), (*sha).to_string());
            }
            ["branch", branch, start] => {
                if state.branches.contains_key(*branch) {
                    return Err(failed(&rendered, "already exists"));
                }
                let sha = state
                    .resolve(start)
                    .ok_or_else(|| failed(&rendered, "not a valid object name"))?;
                state.branches.insert((*branch).to_string(), sha);
            }
            ["reset", "--hard", sha] => {
                let current = state.current()?;
                state.branches.insert(current, (*sha).to_string());
                clear_work_tree(state);
            }
            ["reset", "--hard"] => clear_work_tree(state),
            ["merge", "--abort"] => {
                state.merge_in_progress = false;
                state.conflicts = false;
                state.open_changes = false;
            }
            ["rebase", "--abort"] => {
                state.rebase_in_progress = false;
                state.conflicts = false;
            }
            ["merge", "--no-edit", "--ff", _] | ["pull", "--ff-only", _, _] => {
                state.advance_current()?;
            }
            ["merge", "--squash", "--ff", _] => state.open_changes = true,
            ["rebase", _] => state.advance_current()?,
            ["-c", "core.editor=true", "commit", "--no-edit"] => {
                state.merge_in_progress = false;
                state.open_changes = false;
                state.advance_current()?;
            }
            ["-c", "core.editor=true", "rebase", "--continue"] => {
                state.rebase_in_progress = false;
                state.advance_current()?;
            }
            ["add", "-A"] => {}
            ["commit", "-m", _] => {
                state.open_changes = false;
                state.advance_current()?;
            }
            ["stash", "push", "-m", message] => {
                let current = state.current.clone().unwrap_or_default();
                state.stash.insert(0, format!("On {current}: {message}"));
                state.open_changes = false;
            }
            ["stash", "pop", entry] => {
                let index = entry
                    .trim_start_matches("stash@{")
                    .trim_end_matches('}')
                    .parse::<usize>()
                    .map_err(|_| failed(&rendered, "bad stash entry"))?;
                if index >= state.stash.len() {
                    return Err(failed(&rendered, "no stash entries found"));
                }
                state.stash.remove(index);
                state.open_changes = true;
            }
            ["push", rest @ ..] => simulate_push(state, rest),
            ["fetch", ..] => {}
            ["config", "--unset", key] => {
                state
                    .config
                    .remove(*key)
                    .ok_or_else(|| failed(&rendered, "key not found"))?;
            }
            ["config", key, value] => {
                state.config.insert((*key).to_string(), (*value).to_string());
            }
            _ => return Err(failed(&rendered, "unsupported by FakeRepo")),
        }
        Ok(())
    }
}

fn clear_work_tree(state: &mut State) {
    state.open_changes = false;
    state.conflicts = false;
    state.merge_in_progress = false;
    state.rebase_in_progress = false;
}

fn simulate_push(state: &mut State, args: &[&str]) {
    let positional: Vec<&str> = args
        .iter()
        .copied()
        .filter(|arg| !arg.starts_with('-'))
        .collect();
    if args.contains(&"--delete") {
        if let [remote, branch] = positional.as_slice() {
            state.remote_branches.remove(&format!("{remote}/{branch}"));
        }
        return;
    }
    if let [remote, branch] = positional.as_slice()
        && let Some(sha) = state.branches.get(*branch).cloned()
    {
        state.remote_branches.insert(format!("{remote}/{branch}"), sha);
    }
}

impl Runner for FakeRepo {
    fn run(&self, _cwd: &Path, args: &[&str]) -> GitResult<String> {
        let mut state = self.state.borrow_mut();
        let rendered = args.join(" ");
        state.calls.push(rendered.clone());
        match Self::take_failure(&mut state, &rendered) {
            Some(FailureKind::Conflict) => {
                state.conflicts = true;
                state.open_changes = true;
                if rendered.starts_with("rebase") || rendered.contains("rebase --continue") {
                    state.rebase_in_progress = true;
                } else if !rendered.starts_with("stash") && !rendered.contains("--squash") {
                    state.merge_in_progress = true;
                }
                Err(failed(&format_command(args), "CONFLICT (content): Merge conflict in file.txt"))
            }
            Some(FailureKind::Other) => Err(failed(&format_command(args), "fatal: unable to access remote")),
            None => Self::simulate(&mut state, args).map(|()| String::new()),
        }
    }
}

impl GitQuery for FakeRepo {
    fn current_branch(&self) -> GitResult<Option<String>> {
        Ok(self.state.borrow().current.clone())
    }

    fn previously_checked_out_branch(&self) -> GitResult<Option<String>> {
        Ok(self.state.borrow().previous.clone())
    }

    fn sha_of(&self, rev: &str) -> GitResult<Option<String>> {
        Ok(self.state.borrow().resolve(rev))
    }

    fn local_branches(&self) -> GitResult<Vec<String>> {
        Ok(self.state.borrow().branches.keys().cloned().collect())
    }

    fn remotes(&self) -> GitResult<Vec<String>> {
        Ok(self.state.borrow().remotes.clone())
    }

    fn status(&self) -> GitResult<RepoStatus> {
        let state = self.state.borrow();
        Ok(RepoStatus {
            open_changes: state.open_changes,
            conflicts: state.conflicts,
            merge_in_progress: state.merge_in_progress,
            rebase_in_progress: state.rebase_in_progress,
        })
    }

    fn changed_files(&self, from: &str, to: &str) -> GitResult<Vec<String>> {
        let state = self.state.borrow();
        if state.resolve(from) == state.resolve(to) {
            Ok(Vec::new())
        } else {
            Ok(vec!["file.txt".to_string()])
        }
    }

    fn config_entries(&self, pattern: &str) -> GitResult<Vec<(String, String)>> {
        let regex = regex::Regex::new(pattern).map_err(|e| failed("config", &e.to_string()))?;
        Ok(self
            .state
            .borrow()
            .config
            .iter()
            .filter(|(key, _)| regex.is_match(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn stash_entries(&self) -> GitResult<Vec<String>> {
        Ok(self.state.borrow().stash.clone())
    }
}

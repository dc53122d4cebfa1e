// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::GitError;
use crate::git::backend::{GitQuery, ShellBackend};
use crate::git::cmd;
use crate::git::discovery::{current_branch, discover, is_git_repo};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Initialize a repository on `main` with one empty commit.
fn init_test_repo_with_commit(path: &Path) -> std::io::Result<()> {
    for args in [
        &["init", "--quiet", "--initial-branch=main"][..],
        &["config", "user.email", "test@example.com"],
        &["config", "user.name", "Test"],
        &["commit", "--allow-empty", "-m", "Initial commit", "--quiet"],
    ] {
        let output = Command::new("git").args(args).current_dir(path).output()?;
        if !output.status.success() {
            return Err(std::io::Error::other(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
    }
    Ok(())
}

#[test]
fn test_is_git_repo() {
    let temp = temp_dir();
    assert!(!is_git_repo(temp.path()));
    gix::init(temp.path()).expect("failed to init repo");
    assert!(is_git_repo(temp.path()));
}

#[test]
fn test_discover_from_subdirectory() {
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path()).unwrap();
    let nested = temp.path().join("a").join("b");
    std::fs::create_dir_all(&nested).unwrap();

    let paths = discover(&nested).unwrap();
    let root = temp.path().canonicalize().unwrap();
    assert_eq!(paths.root, root);
    assert_eq!(paths.git_dir, root.join(".git"));
}

#[test]
fn test_discover_outside_repo() {
    let temp = temp_dir();
    let err = discover(temp.path()).unwrap_err();
    assert!(matches!(err, GitError::RepoNotFound { .. } | GitError::Gix(_)));
}

#[test]
fn test_current_branch_via_gix() {
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path()).unwrap();
    assert_eq!(current_branch(temp.path()).unwrap().as_deref(), Some("main"));
}

#[test]
fn test_cmd_branch_lifecycle() {
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path()).unwrap();
    let dir = temp.path();
    let backend = ShellBackend::new(dir).unwrap();

    cmd::create_branch(&backend, dir, "feature", "main").unwrap();
    cmd::checkout(&backend, dir, "feature").unwrap();
    assert_eq!(backend.current_branch().unwrap().as_deref(), Some("feature"));
    assert_eq!(
        backend.previously_checked_out_branch().unwrap().as_deref(),
        Some("main")
    );

    cmd::checkout(&backend, dir, "main").unwrap();
    cmd::delete_local_branch(&backend, dir, "feature", true).unwrap();
    assert!(!backend.has_local_branch("feature").unwrap());
}

#[test]
fn test_cmd_stash_round_trip() {
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path()).unwrap();
    let dir = temp.path();
    let backend = ShellBackend::new(dir).unwrap();

    std::fs::write(dir.join("wip.txt"), "work in progress").unwrap();
    cmd::stash(&backend, dir).unwrap();
    assert!(!backend.status().unwrap().open_changes);
    let entries = backend.stash_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].ends_with(cmd::STASH_MESSAGE));

    cmd::pop_stash(&backend, dir, 0).unwrap();
    assert!(dir.join("wip.txt").exists());
    assert!(backend.stash_entries().unwrap().is_empty());
}

#[test]
fn test_cmd_config_set_and_unset() {
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path()).unwrap();
    let dir = temp.path();
    let backend = ShellBackend::new(dir).unwrap();

    cmd::set_config(&backend, dir, "arbor-branch.x.parent", "main").unwrap();
    assert_eq!(backend.config_entries(r"^arbor-branch\.").unwrap().len(), 1);
    cmd::unset_config(&backend, dir, "arbor-branch.x.parent").unwrap();
    assert!(backend.config_entries(r"^arbor-branch\.").unwrap().is_empty());
}

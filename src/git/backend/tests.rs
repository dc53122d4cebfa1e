// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{
    GitQuery, PrintOnly, RepoStatus, Runner, ShellBackend, format_command, parse_lines,
    parse_porcelain, reports_conflict,
};
use crate::error::GitError;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn repo_with_commit() -> TempDir {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    git(temp.path(), &["init", "--quiet", "--initial-branch=main"]);
    git(temp.path(), &["config", "user.email", "test@example.com"]);
    git(temp.path(), &["config", "user.name", "Test"]);
    git(temp.path(), &["commit", "--allow-empty", "-m", "initial", "--quiet"]);
    temp
}

#[test]
fn test_parse_porcelain_clean() {
    assert_eq!(parse_porcelain(""), RepoStatus::default());
}

#[test]
fn test_parse_porcelain_detects_conflicts() {
    let status = parse_porcelain(" M src/lib.rs\nUU src/main.rs\n?? notes.txt\n");
    assert!(status.open_changes);
    assert!(status.conflicts);
    assert!(status.is_unresolved());

    let status = parse_porcelain("?? notes.txt\n");
    assert!(status.open_changes);
    assert!(!status.conflicts);
}

#[test]
fn test_reports_conflict() {
    assert!(reports_conflict(
        "Auto-merging a.txt\nCONFLICT (content): Merge conflict in a.txt\nAutomatic merge failed"
    ));
    assert!(reports_conflict("error: could not apply 1a2b3c... change"));
    assert!(!reports_conflict("fatal: 'origin' does not appear to be a git repository"));
}

#[test]
fn test_format_command_quotes_whitespace() {
    assert_eq!(
        format_command(&["commit", "-m", "ship it"]),
        "git commit -m \"ship it\""
    );
}

#[test]
fn test_parse_lines_skips_blanks() {
    assert_eq!(parse_lines("a\n\n  b  \n"), vec!["a", "b"]);
}

#[test]
fn test_print_only_never_executes() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    // not a repository: a real run would fail
    let output = PrintOnly.run(temp.path(), &["branch", "-D", "main"]);
    assert_eq!(output.unwrap(), "");
}

#[test]
fn test_shell_backend_queries() {
    let temp = repo_with_commit();
    let backend = ShellBackend::new(temp.path()).unwrap();

    assert_eq!(backend.current_branch().unwrap().as_deref(), Some("main"));
    assert!(backend.has_local_branch("main").unwrap());
    assert!(!backend.has_local_branch("feature").unwrap());
    assert!(backend.sha_of("main").unwrap().is_some());
    assert!(backend.remotes().unwrap().is_empty());
    assert_eq!(backend.status().unwrap(), RepoStatus::default());

    std::fs::write(temp.path().join("file.txt"), "content").unwrap();
    assert!(backend.status().unwrap().open_changes);
}

#[test]
fn test_shell_backend_run_and_config_entries() {
    let temp = repo_with_commit();
    let backend = ShellBackend::new(temp.path()).unwrap();

    backend.run(temp.path(), &["branch", "feature", "main"]).unwrap();
    backend
        .run(temp.path(), &["config", "arbor-branch.feature.parent", "main"])
        .unwrap();

    assert_eq!(backend.local_branches().unwrap(), vec!["feature", "main"]);
    assert_eq!(
        backend
            .config_entries(r"^arbor-branch\..*\.parent$")
            .unwrap(),
        vec![("arbor-branch.feature.parent".to_string(), "main".to_string())]
    );
    assert!(backend.config_entries(r"^nothing\.").unwrap().is_empty());
}

#[test]
fn test_shell_backend_classifies_merge_conflict() {
    let temp = repo_with_commit();
    let dir = temp.path();
    std::fs::write(dir.join("a.txt"), "base\n").unwrap();
    git(dir, &["add", "a.txt"]);
    git(dir, &["commit", "-m", "base", "--quiet"]);
    git(dir, &["checkout", "--quiet", "-b", "feature"]);
    std::fs::write(dir.join("a.txt"), "feature\n").unwrap();
    git(dir, &["commit", "-am", "feature", "--quiet"]);
    git(dir, &["checkout", "--quiet", "main"]);
    std::fs::write(dir.join("a.txt"), "main\n").unwrap();
    git(dir, &["commit", "-am", "main", "--quiet"]);

    let backend = ShellBackend::new(dir).unwrap();
    let err = backend
        .run(dir, &["merge", "--no-edit", "--ff", "feature"])
        .unwrap_err();
    assert!(matches!(err, GitError::Conflict { .. }), "got {err:?}");

    let status = backend.status().unwrap();
    assert!(status.conflicts);
    assert!(status.merge_in_progress);
    assert!(!status.rebase_in_progress);
}

#[test]
fn test_shell_backend_plain_failure_is_not_conflict() {
    let temp = repo_with_commit();
    let backend = ShellBackend::new(temp.path()).unwrap();
    let err = backend
        .run(temp.path(), &["checkout", "does-not-exist"])
        .unwrap_err();
    assert!(matches!(err, GitError::CommandFailed { .. }), "got {err:?}");
}

// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the workflows.
//!
//! Each test drives a real work tree cloned from a bare `origin` in a
//! temporary directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use arbor::cli::workflow::{HackArgs, ShipArgs, SyncArgs};
use arbor::cmd::Session;
use arbor::cmd::append::run_hack_command;
use arbor::cmd::resume::{run_continue_command, run_discard_command, run_undo_command};
use arbor::cmd::ship::run_ship_command;
use arbor::cmd::sync::run_sync_command;
use arbor::config::Config;
use arbor::config::types::SyncStrategy;
use arbor::vm::interpreter::Outcome;
use arbor::vm::opcode::Opcode;
use arbor::vm::resume::FixedResponse;
use arbor::vm::statefile::LoadedState;
use tempfile::TempDir;

struct TestRepo {
    _dir: TempDir,
    work: PathBuf,
}

fn git(cwd: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@test.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@test.com")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

impl TestRepo {
    /// Work tree on `main` with one commit, pushed to a bare `origin`.
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let origin = dir.path().join("origin.git");
        let work = dir.path().join("work");
        fs::create_dir_all(&origin).unwrap();
        fs::create_dir_all(&work).unwrap();

        git(&origin, &["init", "-q", "--bare", "--initial-branch=main"]);
        git(&work, &["init", "-q", "--initial-branch=main"]);
        git(&work, &["config", "user.email", "test@test.com"]);
        git(&work, &["config", "user.name", "Test"]);
        fs::write(work.join("README.md"), "# Test\n").unwrap();
        git(&work, &["add", "README.md"]);
        git(&work, &["commit", "-q", "-m", "Initial commit"]);
        git(&work, &["remote", "add", "origin", origin.to_str().unwrap()]);
        git(&work, &["push", "-q", "-u", "origin", "main"]);

        Self { _dir: dir, work }
    }

    fn git(&self, args: &[&str]) -> String {
        git(&self.work, args)
    }

    fn commit_file(&self, name: &str, content: &str, message: &str) {
        fs::write(self.work.join(name), content).unwrap();
        self.git(&["add", name]);
        self.git(&["commit", "-q", "-m", message]);
    }

    /// Install an executable hook script under `.git/hooks`.
    #[cfg(unix)]
    fn install_hook(&self, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = self.work.join(".git").join("hooks").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn current_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn session(&self, config: &Config) -> Session {
        let config = config.clone();
        Session::open(&self.work, move |_| Ok(config)).expect("failed to open session")
    }
}

fn hack(repo: &TestRepo, branch: &str) {
    let session = repo.session(&Config::default());
    let prompt = FixedResponse("quit".to_string());
    let outcome = run_hack_command(
        &HackArgs {
            branch: branch.to_string(),
        },
        &session.context(&prompt, None),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::Finished);
}

#[test]
fn hack_then_ship_lands_on_main() {
    let repo = TestRepo::new();
    hack(&repo, "feature");
    assert_eq!(repo.current_branch(), "feature");
    assert_eq!(repo.git(&["config", "arbor-branch.feature.parent"]), "main");

    repo.commit_file("feature.txt", "feature\n", "WIP");
    let session = repo.session(&Config::default());
    let prompt = FixedResponse("quit".to_string());
    let outcome = run_ship_command(
        &ShipArgs {
            message: Some("Add feature".to_string()),
            ..ShipArgs::default()
        },
        &session.context(&prompt, None),
    )
    .unwrap();

    assert_eq!(outcome, Outcome::Finished);
    assert_eq!(repo.current_branch(), "main");
    assert_eq!(repo.git(&["log", "-1", "--format=%s", "main"]), "Add feature");
    assert!(repo.work.join("feature.txt").exists());
    assert_eq!(repo.git(&["branch", "--list", "feature"]), "");
    assert_eq!(
        repo.git(&["rev-parse", "main"]),
        repo.git(&["rev-parse", "origin/main"])
    );
}

#[test]
fn ship_without_changes_is_refused_at_runtime() {
    let repo = TestRepo::new();
    hack(&repo, "empty");

    let session = repo.session(&Config::default());
    let prompt = FixedResponse("quit".to_string());
    let outcome = run_ship_command(&ShipArgs::default(), &session.context(&prompt, None)).unwrap();

    assert!(matches!(outcome, Outcome::Halted(_)));
    assert!(matches!(
        session.state_file.load().unwrap(),
        LoadedState::Unfinished(_)
    ));
    assert_eq!(
        run_discard_command(&session.context(&prompt, None)).unwrap(),
        Outcome::Finished
    );
    assert_eq!(session.state_file.load().unwrap(), LoadedState::Absent);
}

#[test]
fn sync_conflict_then_undo_restores_branch() {
    let repo = TestRepo::new();
    hack(&repo, "a");
    repo.commit_file("file.txt", "from a\n", "a change");
    repo.git(&["checkout", "-q", "main"]);
    repo.commit_file("file.txt", "from main\n", "main change");
    repo.git(&["push", "-q", "origin", "main"]);
    repo.git(&["checkout", "-q", "a"]);
    let before = repo.git(&["rev-parse", "a"]);

    let session = repo.session(&Config::default());
    let prompt = FixedResponse("quit".to_string());
    let ctx = session.context(&prompt, None);
    let outcome = run_sync_command(&SyncArgs::default(), &ctx).unwrap();
    let Outcome::Halted(details) = outcome else {
        panic!("expected a halted run, got {outcome:?}");
    };
    assert_eq!(details.end_branch, "a");
    assert!(details.can_skip);
    assert!(session.state_file.path().exists());

    let outcome = run_undo_command(&ctx).unwrap();
    assert!(matches!(outcome, Outcome::Undone { .. }));
    assert_eq!(repo.current_branch(), "a");
    assert_eq!(repo.git(&["rev-parse", "a"]), before);
    assert!(!repo.work.join(".git").join("MERGE_HEAD").exists());
    assert!(!session.state_file.path().exists());
}

#[test]
fn dry_run_leaves_repository_untouched() {
    let repo = TestRepo::new();
    hack(&repo, "a");
    repo.commit_file("a.txt", "a\n", "a change");
    repo.git(&["checkout", "-q", "main"]);
    repo.commit_file("main.txt", "main\n", "main change");
    repo.git(&["checkout", "-q", "a"]);
    let before = repo.git(&["rev-parse", "a"]);

    let mut config = Config::default();
    config.global.dry = true;
    let session = repo.session(&config);
    let prompt = FixedResponse("quit".to_string());
    let outcome = run_sync_command(&SyncArgs::default(), &session.context(&prompt, None)).unwrap();

    assert_eq!(outcome, Outcome::Finished);
    assert_eq!(repo.current_branch(), "a");
    assert_eq!(repo.git(&["rev-parse", "a"]), before);
    assert!(!session.state_file.path().exists());
}

/// Feature branch `a` with its own commit, behind a new commit on `main`,
/// and a hook that refuses to rebase onto `main`.
#[cfg(unix)]
fn refused_rebase_setup() -> (TestRepo, Config) {
    let repo = TestRepo::new();
    hack(&repo, "a");
    repo.commit_file("a.txt", "a\n", "a change");
    repo.git(&["checkout", "-q", "main"]);
    repo.commit_file("main.txt", "main\n", "main change");
    repo.git(&["push", "-q", "origin", "main"]);
    repo.git(&["checkout", "-q", "a"]);
    repo.install_hook(
        "pre-rebase",
        "#!/bin/sh\nif [ \"$1\" = \"main\" ]; then\n  echo refused >&2\n  exit 1\nfi\nexit 0\n",
    );
    let mut config = Config::default();
    config.sync.strategy = SyncStrategy::Rebase;
    (repo, config)
}

#[cfg(unix)]
#[test]
fn refused_rebase_then_undo_restores_branch() {
    let (repo, config) = refused_rebase_setup();
    let before = repo.git(&["rev-parse", "a"]);

    let session = repo.session(&config);
    let prompt = FixedResponse("quit".to_string());
    let ctx = session.context(&prompt, None);
    let outcome = run_sync_command(&SyncArgs::default(), &ctx).unwrap();
    let Outcome::Halted(details) = outcome else {
        panic!("expected a halted run, got {outcome:?}");
    };
    assert!(!details.can_skip);
    let LoadedState::Unfinished(state) = session.state_file.load().unwrap() else {
        panic!("expected an unfinished run");
    };
    assert_eq!(
        state.pending_program.peek(),
        Some(&Opcode::Rebase {
            branch: "main".to_string()
        })
    );

    let outcome = run_undo_command(&ctx).unwrap();
    assert!(matches!(outcome, Outcome::Undone { .. }));
    assert_eq!(repo.current_branch(), "a");
    assert_eq!(repo.git(&["rev-parse", "a"]), before);
    assert!(!session.state_file.path().exists());
}

#[cfg(unix)]
#[test]
fn refused_rebase_is_retried_on_continue() {
    let (repo, config) = refused_rebase_setup();
    let main = repo.git(&["rev-parse", "main"]);

    let session = repo.session(&config);
    let prompt = FixedResponse("quit".to_string());
    let ctx = session.context(&prompt, None);
    let outcome = run_sync_command(&SyncArgs::default(), &ctx).unwrap();
    assert!(matches!(outcome, Outcome::Halted(_)));

    fs::remove_file(repo.work.join(".git").join("hooks").join("pre-rebase")).unwrap();
    let outcome = run_continue_command(&ctx).unwrap();

    assert_eq!(outcome, Outcome::Finished);
    assert_eq!(repo.git(&["merge-base", "main", "a"]), main);
    assert_eq!(repo.git(&["log", "-1", "--format=%s", "a"]), "a change");
    assert!(!session.state_file.path().exists());
}

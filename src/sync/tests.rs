// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{BranchInfo, SyncPlanner};
use crate::config::types::{BranchesConfig, SyncConfig, SyncStrategy};
use crate::lineage::Lineage;
use crate::test_utils::FakeRepo;
use crate::vm::program::Program;

/// main <- A <- B <- C
fn chain() -> Lineage {
    let mut lineage = Lineage::new();
    lineage.set_parent("A", "main");
    lineage.set_parent("B", "A");
    lineage.set_parent("C", "B");
    lineage
}

fn tracked(name: &str) -> BranchInfo {
    BranchInfo {
        name: name.to_string(),
        has_tracking: true,
    }
}

fn local(name: &str) -> BranchInfo {
    BranchInfo {
        name: name.to_string(),
        has_tracking: false,
    }
}

fn plan(lineage: &Lineage, sync: &SyncConfig, has_remote: bool, branch: &BranchInfo) -> String {
    let roles = BranchesConfig::default();
    let planner = SyncPlanner::new(lineage, &roles, sync, has_remote);
    let mut program = Program::new();
    planner.branch_program(branch, true, &mut program);
    program.to_string()
}

#[test]
fn test_chain_syncs_root_to_leaf() {
    let lineage = chain();
    let roles = BranchesConfig::default();
    let sync = SyncConfig::default();
    let planner = SyncPlanner::new(&lineage, &roles, &sync, true);
    let mut program = Program::new();
    planner
        .branches_program(&[tracked("C"), tracked("A"), tracked("B")], true, &mut program)
        .unwrap();
    insta::assert_snapshot!(program.to_string(), @r"
    1. checkout A
    2. merge origin/A
    3. merge main
    4. push A to origin
    5. checkout B
    6. merge origin/B
    7. merge A
    8. push B to origin
    9. checkout C
    10. merge origin/C
    11. merge B
    12. push C to origin
    ");
}

#[test]
fn test_main_rebases_onto_tracking_and_has_no_parent() {
    let program = plan(&chain(), &SyncConfig::default(), true, &tracked("main"));
    insta::assert_snapshot!(program, @r"
    1. checkout main
    2. rebase onto origin/main
    3. push main to origin
    ");
}

#[test]
fn test_offline_only_reconciles_with_parent() {
    let sync = SyncConfig {
        offline: true,
        ..SyncConfig::default()
    };
    let program = plan(&chain(), &sync, true, &tracked("B"));
    insta::assert_snapshot!(program, @r"
    1. checkout B
    2. merge A
    ");
}

#[test]
fn test_without_remote_behaves_offline() {
    let program = plan(&chain(), &SyncConfig::default(), false, &tracked("B"));
    assert_eq!(program, "1. checkout B\n2. merge A\n");
}

#[test]
fn test_untracked_branch_skips_remote_reconcile() {
    let program = plan(&chain(), &SyncConfig::default(), true, &local("B"));
    insta::assert_snapshot!(program, @r"
    1. checkout B
    2. merge A
    ");
}

#[test]
fn test_untracked_branch_is_published_when_configured() {
    let sync = SyncConfig {
        push_new_branches: true,
        ..SyncConfig::default()
    };
    let program = plan(&chain(), &sync, true, &local("B"));
    insta::assert_snapshot!(program, @r"
    1. checkout B
    2. merge A
    3. push new branch B to origin
    ");
}

#[test]
fn test_rebase_strategy_force_pushes_features() {
    let sync = SyncConfig {
        strategy: SyncStrategy::Rebase,
        ..SyncConfig::default()
    };
    let program = plan(&chain(), &sync, true, &tracked("B"));
    insta::assert_snapshot!(program, @r"
    1. checkout B
    2. rebase onto origin/B
    3. rebase onto A
    4. force-push B to origin
    ");
}

#[test]
fn test_push_disabled() {
    let sync = SyncConfig {
        push_branches: false,
        ..SyncConfig::default()
    };
    let program = plan(&chain(), &sync, true, &tracked("B"));
    assert!(!program.contains("push"));

    let roles = BranchesConfig::default();
    let lineage = chain();
    let config = SyncConfig::default();
    let planner = SyncPlanner::new(&lineage, &roles, &config, true);
    let mut program = Program::new();
    planner.branch_program(&tracked("B"), false, &mut program);
    assert_eq!(program.len(), 3);
}

#[test]
fn test_perennial_without_parent() {
    let roles = BranchesConfig {
        perennials: vec!["release".to_string()],
        ..BranchesConfig::default()
    };
    let lineage = chain();
    let sync = SyncConfig {
        push_new_branches: true,
        ..SyncConfig::default()
    };
    let planner = SyncPlanner::new(&lineage, &roles, &sync, true);
    let mut program = Program::new();
    planner.branch_program(&local("release"), true, &mut program);
    assert_eq!(program.to_string(), "1. checkout release\n");
}

#[test]
fn test_branch_info_load() {
    let repo = FakeRepo::new()
        .with_branch("A", Some("main"), true)
        .with_branch("B", Some("A"), false);
    let infos =
        BranchInfo::load_all(&repo, &["A".to_string(), "B".to_string()], "origin").unwrap();
    assert_eq!(infos, vec![tracked("A"), local("B")]);
}

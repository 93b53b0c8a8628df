//! Integration tests for the sampling cycle.
//!
//! These tests drive full ticks against an in-memory process table and check the
//! produced feed lines.

mod common;

use common::FakeProcTable;
use herakles_uss_feed::cycle::{CycleOutcome, SamplingCycle};
use herakles_uss_feed::report::render_frame;

fn lines(outcome: &CycleOutcome) -> Vec<String> {
    outcome.reports.iter().map(|r| r.to_string()).collect()
}

fn cycle_with(table: &FakeProcTable) -> SamplingCycle<FakeProcTable> {
    SamplingCycle::new(table.clone())
}

#[test]
fn test_end_to_end_scenario() {
    let table = FakeProcTable::new();
    let mut cycle = cycle_with(&table);

    table.spawn(100, 4096, "worker");
    assert_eq!(
        lines(&cycle.run(false)),
        vec!["new|pid=100|ppid=1|uss=4096|name=worker"]
    );

    table.set_uss(100, 8192);
    assert_eq!(lines(&cycle.run(false)), vec!["update|pid=100|uss=8192"]);

    table.kill(100);
    assert_eq!(lines(&cycle.run(false)), vec!["old|pid=100"]);
    assert!(cycle.registry().get(100).is_none());
}

#[test]
fn test_tick_idempotence() {
    let table = FakeProcTable::new();
    for pid in [1, 50, 900] {
        table.spawn(pid, pid as u64 * 1024, "proc");
    }
    let mut cycle = cycle_with(&table);

    assert_eq!(cycle.run(false).reports.len(), 3);
    let second = cycle.run(false);
    assert!(second.reports.is_empty());
    assert_eq!(render_frame(&second.reports), ">>>\n<<<\n");
}

#[test]
fn test_new_then_steady() {
    let table = FakeProcTable::new();
    let mut cycle = cycle_with(&table);
    table.spawn(7, 1024, "a");
    cycle.run(false);

    table.spawn(8, 2048, "b");
    assert_eq!(
        lines(&cycle.run(false)),
        vec!["new|pid=8|ppid=1|uss=2048|name=b"]
    );
    assert!(cycle.run(false).reports.is_empty());
}

#[test]
fn test_memory_change_moves_baseline_once() {
    let table = FakeProcTable::new();
    table.spawn(100, 4096, "worker");
    let mut cycle = cycle_with(&table);
    cycle.run(false);

    table.set_uss(100, 12288);
    assert_eq!(lines(&cycle.run(false)), vec!["update|pid=100|uss=12288"]);
    assert!(cycle.run(false).reports.is_empty());

    // Going back to the old value is a change again
    table.set_uss(100, 4096);
    assert_eq!(lines(&cycle.run(false)), vec!["update|pid=100|uss=4096"]);
}

#[test]
fn test_rename_precedence() {
    let table = FakeProcTable::new();
    table.spawn(100, 4096, "worker");
    let mut cycle = cycle_with(&table);
    cycle.run(false);

    table.set_uss(100, 8192);
    table.rename(100, Some("worker-2"));
    assert_eq!(
        lines(&cycle.run(false)),
        vec!["update|pid=100|uss=8192|name=worker-2"]
    );
    assert!(cycle.run(false).reports.is_empty());
}

#[test]
fn test_rename_without_memory_change_carries_current_value() {
    let table = FakeProcTable::new();
    table.spawn(42, 1024, "sh");
    let mut cycle = cycle_with(&table);
    cycle.run(false);

    table.rename(42, Some("bash"));
    assert_eq!(
        lines(&cycle.run(false)),
        vec!["update|pid=42|uss=1024|name=bash"]
    );
}

#[test]
fn test_vanish_and_reappear_is_fresh() {
    let table = FakeProcTable::new();
    table.spawn(300, 4096, "old-owner");
    let mut cycle = cycle_with(&table);
    cycle.run(false);

    table.kill(300);
    assert_eq!(lines(&cycle.run(false)), vec!["old|pid=300"]);
    assert!(cycle.run(false).reports.is_empty());

    table.set(300, Some(2048), Some("new-owner"), Some(77));
    assert_eq!(
        lines(&cycle.run(false)),
        vec!["new|pid=300|ppid=77|uss=2048|name=new-owner"]
    );
}

#[test]
fn test_unreadable_memory_counts_as_vanished() {
    let table = FakeProcTable::new();
    table.spawn(5, 4096, "racy");
    let mut cycle = cycle_with(&table);
    cycle.run(false);

    // Listed but exits before its memory map is read
    table.set(5, None, Some("racy"), Some(1));
    let outcome = cycle.run(false);
    assert_eq!(lines(&outcome), vec!["old|pid=5"]);
    assert_eq!(outcome.unavailable, 1);
    assert_eq!(outcome.tracked, 0);
}

#[test]
fn test_never_seen_unreadable_process_is_silent() {
    let table = FakeProcTable::new();
    table.set(9, None, Some("kthread"), Some(2));
    let mut cycle = cycle_with(&table);

    let outcome = cycle.run(false);
    assert!(outcome.reports.is_empty());
    assert_eq!(outcome.enumerated, 1);
    assert_eq!(outcome.unavailable, 1);
}

#[test]
fn test_missing_name_and_parent() {
    let table = FakeProcTable::new();
    table.set(11, Some(0), None, None);
    let mut cycle = cycle_with(&table);

    assert_eq!(lines(&cycle.run(false)), vec!["new|pid=11|ppid=0|uss=0"]);

    table.rename(11, Some("late"));
    assert_eq!(
        lines(&cycle.run(false)),
        vec!["update|pid=11|uss=0|name=late"]
    );

    table.rename(11, None);
    assert_eq!(lines(&cycle.run(false)), vec!["update|pid=11|uss=0|name="]);
}

#[test]
fn test_parent_is_captured_once() {
    let table = FakeProcTable::new();
    table.set(20, Some(1024), Some("child"), Some(10));
    let mut cycle = cycle_with(&table);
    cycle.run(false);

    // Reparenting is not tracked
    table.set(20, Some(1024), Some("child"), Some(1));
    assert!(cycle.run(false).reports.is_empty());
    assert_eq!(cycle.registry().get(20).and_then(|r| r.ppid), Some(10));

    let resync = cycle.run(true);
    assert_eq!(lines(&resync), vec!["new|pid=20|ppid=10|uss=1024|name=child"]);
}

#[test]
fn test_names_are_sanitized_on_the_wire() {
    let table = FakeProcTable::new();
    table.spawn(3, 1024, "evil|name\nx");
    let mut cycle = cycle_with(&table);

    assert_eq!(
        lines(&cycle.run(false)),
        vec!["new|pid=3|ppid=1|uss=1024|name=evil_name_x"]
    );
    // Raw name unchanged, so no spurious rename
    assert!(cycle.run(false).reports.is_empty());
}

#[test]
fn test_resync_reports_everything_and_commits() {
    let table = FakeProcTable::new();
    table.spawn(1, 1024, "init");
    table.spawn(2, 2048, "daemon");
    table.spawn(3, 4096, "gone");
    let mut cycle = cycle_with(&table);
    cycle.run(false);

    table.set_uss(2, 8192);
    table.rename(1, Some("systemd"));
    table.kill(3);

    let outcome = cycle.run(true);
    assert!(outcome.resync);
    assert_eq!(
        lines(&outcome),
        vec![
            "new|pid=1|ppid=1|uss=1024|name=systemd",
            "new|pid=2|ppid=1|uss=8192|name=daemon",
            "old|pid=3",
        ]
    );

    // Staged values were committed by the resync
    assert!(cycle.run(false).reports.is_empty());
}

#[test]
fn test_reports_ascend_with_mixed_kinds() {
    let table = FakeProcTable::new();
    for pid in [10, 20, 30, 40] {
        table.spawn(pid, 1024, "p");
    }
    let mut cycle = cycle_with(&table);
    cycle.run(false);

    table.kill(10);
    table.set_uss(30, 2048);
    table.spawn(25, 512, "q");
    table.kill(40);

    assert_eq!(
        lines(&cycle.run(false)),
        vec![
            "old|pid=10",
            "new|pid=25|ppid=1|uss=512|name=q",
            "update|pid=30|uss=2048",
            "old|pid=40",
        ]
    );
    assert_eq!(cycle.registry().len(), 3);
}

#[test]
fn test_many_vanish_in_one_sweep() {
    let table = FakeProcTable::new();
    for pid in 1..=50 {
        table.spawn(pid, 4096, "burst");
    }
    let mut cycle = cycle_with(&table);
    cycle.run(false);

    for pid in 1..=50 {
        table.kill(pid);
    }
    let outcome = cycle.run(false);
    assert_eq!(outcome.reports.len(), 50);
    assert!(outcome.reports.iter().all(|r| r.kind() == "old"));
    assert!(cycle.registry().is_empty());
}

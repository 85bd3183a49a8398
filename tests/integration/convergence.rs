//! Integration tests for replica convergence and idempotence

use super::test_utils::{snapshot, write_files, Fixture};
use mirror::sync::EventKind;
use mirror::tree::hasher::ContentComparator;
use std::fs;
use std::path::Path;

/// Source and replica from the reference scenario: one update, one create, one stale subtree
#[test]
fn test_reference_scenario() {
    let fx = Fixture::new();
    write_files(&fx.source, &[("x/1.txt", "hello"), ("x/y/2.txt", "world")]);
    write_files(&fx.replica, &[("x/1.txt", "HELLO"), ("z/3.txt", "old")]);

    let report = fx.reconciler().run_cycle();

    assert_eq!(fs::read_to_string(fx.replica.join("x/1.txt")).unwrap(), "hello");
    assert_eq!(fs::read_to_string(fx.replica.join("x/y/2.txt")).unwrap(), "world");
    assert!(!fx.replica.join("z/3.txt").exists());
    assert!(!fx.replica.join("z").exists());

    assert!(fx.sink.contains(EventKind::FileUpdated, "x/1.txt"));
    assert!(fx.sink.contains(EventKind::FileCopied, "x/y/2.txt"));
    assert!(fx.sink.contains(EventKind::DirCreated, "x/y"));
    assert!(fx.sink.contains(EventKind::FileDeleted, "z/3.txt"));
    assert!(fx.sink.contains(EventKind::DirDeleted, "z"));
    assert!(report.is_clean());
    assert_eq!(snapshot(&fx.source), snapshot(&fx.replica));
}

/// An empty replica converges to a nested source in one cycle
#[test]
fn test_empty_replica_converges() {
    let fx = Fixture::new();
    write_files(
        &fx.source,
        &[
            ("a.txt", "a"),
            ("deep/er/still/b.bin", "\u{0}\u{1}\u{2}"),
            ("deep/c.txt", ""),
        ],
    );

    fx.reconciler().run_cycle();

    assert_eq!(snapshot(&fx.source), snapshot(&fx.replica));
    let comparator = ContentComparator::default();
    for rel in ["a.txt", "deep/er/still/b.bin", "deep/c.txt"] {
        assert!(comparator
            .contents_equal(&fx.source.join(rel), &fx.replica.join(rel))
            .is_identical());
    }
}

/// An empty source folder appears as an empty replica folder
#[test]
fn test_empty_directory_mirrored() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.source.join("empty/nested-empty")).unwrap();

    fx.reconciler().run_cycle();

    assert!(fx.replica.join("empty/nested-empty").is_dir());
    assert_eq!(fs::read_dir(fx.replica.join("empty/nested-empty")).unwrap().count(), 0);
    assert!(fx.sink.contains(EventKind::DirCreated, Path::new("empty/nested-empty")));
}

/// A second cycle with no source changes does nothing
#[test]
fn test_second_cycle_is_idempotent() {
    let fx = Fixture::new();
    write_files(&fx.source, &[("x/1.txt", "hello"), ("x/y/2.txt", "world")]);
    fs::create_dir(fx.source.join("empty")).unwrap();
    write_files(&fx.replica, &[("stale.txt", "bye")]);

    let reconciler = fx.reconciler();
    let first = reconciler.run_cycle();
    assert!(first.changes() > 0);
    fx.sink.drain();

    let second = reconciler.run_cycle();
    assert_eq!(second.changes(), 0);
    assert_eq!(second.errors, 0);
    assert!(fx.sink.events().is_empty());
}

/// Source changes between cycles are picked up by the next cycle
#[test]
fn test_follow_up_cycle_tracks_source_changes() {
    let fx = Fixture::new();
    write_files(&fx.source, &[("keep.txt", "v1"), ("drop/me.txt", "x")]);
    let reconciler = fx.reconciler();
    reconciler.run_cycle();

    write_files(&fx.source, &[("keep.txt", "v2"), ("new/file.txt", "n")]);
    fs::remove_dir_all(fx.source.join("drop")).unwrap();
    fx.sink.drain();

    let report = reconciler.run_cycle();
    assert_eq!(report.files_updated, 1);
    assert_eq!(report.files_copied, 1);
    assert_eq!(report.dirs_deleted, 1);
    assert_eq!(snapshot(&fx.source), snapshot(&fx.replica));
}

/// A truncated replica file (e.g. from an interrupted copy) is repaired
#[test]
fn test_truncated_replica_file_is_recopied() {
    let fx = Fixture::new();
    let content = "0123456789".repeat(1000);
    write_files(&fx.source, &[("big.txt", content.as_str())]);
    write_files(&fx.replica, &[("big.txt", &content[..4096])]);

    let report = fx.reconciler().run_cycle();
    assert_eq!(report.files_updated, 1);
    assert_eq!(fs::read_to_string(fx.replica.join("big.txt")).unwrap(), content);
}

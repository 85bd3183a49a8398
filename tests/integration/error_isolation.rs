//! Integration tests for per-path failure isolation and source integrity

use super::test_utils::{snapshot, write_files, Fixture};
use mirror::sync::EventKind;
use std::fs;

/// Privileged users can read anything; skip permission-based tests for them
#[cfg(unix)]
fn permissions_enforced(path: &std::path::Path) -> bool {
    fs::File::open(path).is_err()
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_does_not_abort_cycle() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    write_files(&fx.source, &[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")]);
    let unreadable = fx.source.join("b.txt");
    fs::set_permissions(&unreadable, fs::Permissions::from_mode(0o000)).unwrap();
    if !permissions_enforced(&unreadable) {
        fs::set_permissions(&unreadable, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let report = fx.reconciler().run_cycle();
    fs::set_permissions(&unreadable, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(fs::read_to_string(fx.replica.join("a.txt")).unwrap(), "a");
    assert_eq!(fs::read_to_string(fx.replica.join("c.txt")).unwrap(), "c");
    assert!(fx.sink.contains(EventKind::Error, "b.txt"));
    assert!(report.errors >= 1);
    assert_eq!(report.files_copied, 2);
}

/// An unlistable source folder is skipped while its siblings still sync
#[cfg(unix)]
#[test]
fn test_unlistable_source_folder_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    write_files(&fx.source, &[("locked/secret.txt", "s"), ("open/visible.txt", "v")]);
    let locked = fx.source.join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report = fx.reconciler().run_cycle();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(fx.replica.join("open/visible.txt").is_file());
    assert!(!fx.replica.join("locked/secret.txt").exists());
    assert!(report.errors >= 1);
}

/// A replica folder that cannot be listed is left in place for this cycle
#[cfg(unix)]
#[test]
fn test_unlistable_replica_folder_not_pruned() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    write_files(&fx.source, &[("keep.txt", "k")]);
    write_files(&fx.replica, &[("stale/hidden.txt", "h")]);
    let stale = fx.replica.join("stale");
    fs::set_permissions(&stale, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&stale).is_ok() {
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report = fx.reconciler().run_cycle();
    fs::set_permissions(&stale, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(stale.is_dir());
    assert!(stale.join("hidden.txt").is_file());
    assert!(fx.sink.contains(EventKind::Error, "stale"));
    assert!(!fx.sink.contains(EventKind::DirDeleted, "stale"));
    assert!(report.errors >= 1);
    assert!(fx.replica.join("keep.txt").is_file());

    // Once listable again, the next cycle prunes it
    fx.reconciler().run_cycle();
    assert!(!stale.exists());
}

/// No sequence of cycles touches anything under source
#[test]
fn test_source_is_never_modified() {
    let fx = Fixture::new();
    write_files(&fx.source, &[("x/1.txt", "hello"), ("x/y/2.txt", "world"), ("p", "file")]);
    fs::create_dir(fx.source.join("empty")).unwrap();
    write_files(&fx.replica, &[("x/1.txt", "HELLO"), ("z/3.txt", "old"), ("p/q.txt", "dir")]);

    let before = snapshot(&fx.source);
    let mtime_before = fs::metadata(fx.source.join("x/1.txt")).unwrap().modified().unwrap();

    let reconciler = fx.reconciler();
    for _ in 0..3 {
        reconciler.run_cycle();
    }

    assert_eq!(snapshot(&fx.source), before);
    assert_eq!(
        fs::metadata(fx.source.join("x/1.txt")).unwrap().modified().unwrap(),
        mtime_before
    );
    assert_eq!(snapshot(&fx.source), snapshot(&fx.replica));
}

//! Per-file errors are absorbed: the scan keeps going and counts them.

use dupescan::duplicates::{DuplicateScanner, ScanEvent};
use dupescan::error::ExitCode;
use dupescan::signal::CancellationToken;
use std::fs;
use tempfile::tempdir;

#[cfg(unix)]
fn make_unreadable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
    // Privileged users ignore permission bits
    if path.is_dir() {
        fs::read_dir(path).is_err()
    } else {
        fs::File::open(path).is_err()
    }
}

#[cfg(unix)]
fn restore(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o755));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_dropped_but_scan_completes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "same bytes").unwrap();
    fs::write(dir.path().join("b"), "same bytes").unwrap();
    let locked = dir.path().join("c");
    fs::write(&locked, "same bytes").unwrap();

    if !make_unreadable(&locked) {
        restore(&locked);
        return;
    }

    let mut events = Vec::new();
    let summary = DuplicateScanner::with_defaults()
        .scan(dir.path(), &CancellationToken::new(), &mut events)
        .unwrap();
    restore(&locked);

    let groups: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Duplicates(g) => Some(g),
            _ => None,
        })
        .collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.failed_reads, 1);
    assert_eq!(summary.classified_bytes, summary.total_bytes);
    assert_eq!(ExitCode::from_summary(&summary), ExitCode::PartialSuccess);
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "pair").unwrap();
    fs::write(dir.path().join("b"), "pair").unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden_copy"), "pair").unwrap();

    if !make_unreadable(&locked) {
        restore(&locked);
        return;
    }

    let mut events = Vec::new();
    let summary = DuplicateScanner::with_defaults()
        .scan(dir.path(), &CancellationToken::new(), &mut events)
        .unwrap();
    restore(&locked);

    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.total_files, 2);
    assert!(summary.skipped_entries >= 1);
    assert!(matches!(events.last(), Some(ScanEvent::Finished(_))));
}

#[cfg(unix)]
#[test]
fn test_unreadable_root_fails_fast() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("f"), "x").unwrap();

    if !make_unreadable(&root) {
        restore(&root);
        return;
    }

    let mut events = Vec::new();
    let result = DuplicateScanner::with_defaults().scan(&root, &CancellationToken::new(), &mut events);
    restore(&root);

    assert!(result.is_err());
    assert!(events.is_empty());
}

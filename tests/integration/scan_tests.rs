use dupescan::duplicates::{
    DuplicateGroup, DuplicateScanner, FinderError, ScanEvent, ScanSummary, ScannerConfig,
};
use dupescan::scanner::WalkerConfig;
use dupescan::signal::CancellationToken;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn scan(root: &Path, config: ScannerConfig) -> (Vec<ScanEvent>, ScanSummary) {
    let mut events = Vec::new();
    let summary = DuplicateScanner::new(config)
        .scan(root, &CancellationToken::new(), &mut events)
        .unwrap();
    (events, summary)
}

fn groups(events: &[ScanEvent]) -> Vec<DuplicateGroup> {
    events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Duplicates(g) => Some(g.clone()),
            _ => None,
        })
        .collect()
}

fn percentages(events: &[ScanEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}

fn names(group: &DuplicateGroup) -> Vec<String> {
    group
        .paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_scan_flat_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "X").unwrap();
    fs::write(dir.path().join("b"), "X").unwrap();
    fs::write(dir.path().join("c"), "Y").unwrap();

    let (events, summary) = scan(dir.path(), ScannerConfig::default());

    let found = groups(&events);
    assert_eq!(found.len(), 1);
    assert_eq!(names(&found[0]), vec!["a", "b"]);
    assert_eq!(found[0].size, 1);

    assert_eq!(percentages(&events).last(), Some(&100));
    assert!(matches!(events.last(), Some(ScanEvent::Finished(_))));
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.unique_files, 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_bytes, 1);
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (events, summary) = scan(dir.path(), ScannerConfig::default());

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ScanEvent::Finished(_)));
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.total_bytes, 0);
    assert!(!summary.cancelled);
}

#[test]
fn test_scan_only_empty_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("e1"), "").unwrap();
    fs::write(dir.path().join("e2"), "").unwrap();

    let (events, summary) = scan(dir.path(), ScannerConfig::default());

    // Nothing to classify: no progress, no groups
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ScanEvent::Finished(_)));
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.total_bytes, 0);
}

#[test]
fn test_scan_empty_files_grouped_beside_data() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("e1"), "").unwrap();
    fs::write(dir.path().join("e2"), "").unwrap();
    fs::write(dir.path().join("x"), "data").unwrap();

    let (events, summary) = scan(dir.path(), ScannerConfig::default());

    let found = groups(&events);
    assert_eq!(found.len(), 1);
    assert_eq!(names(&found[0]), vec!["e1", "e2"]);
    assert_eq!(found[0].size, 0);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(percentages(&events), vec![100]);
}

#[test]
fn test_scan_shared_prefix_different_content() {
    let dir = tempdir().unwrap();
    let head = "H".repeat(64);
    fs::write(dir.path().join("one"), format!("{head}1")).unwrap();
    fs::write(dir.path().join("two"), format!("{head}2")).unwrap();

    let (events, summary) = scan(dir.path(), ScannerConfig::default());

    assert!(groups(&events).is_empty());
    assert_eq!(summary.unique_files, 2);
    assert_eq!(percentages(&events), vec![50, 100]);
}

#[test]
fn test_scan_difference_beyond_short_prefix() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "abcdef").unwrap();
    fs::write(dir.path().join("b"), "abcxyz").unwrap();
    fs::write(dir.path().join("c"), "abcdef").unwrap();

    let config = ScannerConfig::default().with_prefix_len(3);
    let (events, _) = scan(dir.path(), config);

    let found = groups(&events);
    assert_eq!(found.len(), 1);
    assert_eq!(names(&found[0]), vec!["a", "c"]);
}

#[test]
fn test_scan_nested_directories_traversal_order() {
    let dir = tempdir().unwrap();
    let sub1 = dir.path().join("sub1");
    let sub2 = dir.path().join("sub1").join("deeper");
    fs::create_dir_all(&sub2).unwrap();

    fs::write(dir.path().join("z_root.txt"), "nested duplicate").unwrap();
    fs::write(sub1.join("m.txt"), "nested duplicate").unwrap();
    fs::write(sub2.join("a.txt"), "nested duplicate").unwrap();

    let (events, _) = scan(dir.path(), ScannerConfig::default());

    let found = groups(&events);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].len(), 3);

    // Same traversal, same order
    let (again, _) = scan(dir.path(), ScannerConfig::default());
    assert_eq!(groups(&again)[0].paths, found[0].paths);
}

#[test]
fn test_scan_groups_ordered_by_size() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("big1"), "x".repeat(500)).unwrap();
    fs::write(dir.path().join("big2"), "x".repeat(500)).unwrap();
    fs::write(dir.path().join("small1"), "yy").unwrap();
    fs::write(dir.path().join("small2"), "yy").unwrap();

    let (events, summary) = scan(dir.path(), ScannerConfig::default());

    let sizes: Vec<u64> = groups(&events).iter().map(|g| g.size).collect();
    assert_eq!(sizes, vec![2, 500]);
    assert_eq!(summary.duplicate_groups, 2);
    assert_eq!(summary.reclaimable_bytes, 502);
}

#[test]
fn test_scan_multiple_groups_same_size() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a1"), "aaaa").unwrap();
    fs::write(dir.path().join("b1"), "bbbb").unwrap();
    fs::write(dir.path().join("a2"), "aaaa").unwrap();
    fs::write(dir.path().join("b2"), "bbbb").unwrap();
    fs::write(dir.path().join("c1"), "cccc").unwrap();

    let (events, summary) = scan(dir.path(), ScannerConfig::default());

    let found = groups(&events);
    assert_eq!(found.len(), 2);
    for group in &found {
        let n = names(group);
        assert_eq!(n[0].chars().next(), n[1].chars().next());
    }
    assert_eq!(summary.unique_files, 1);
    assert_eq!(summary.classified_bytes, 20);
}

#[test]
fn test_scan_skip_hidden() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("visible"), "same").unwrap();
    fs::write(dir.path().join(".hidden"), "same").unwrap();

    let (events, _) = scan(dir.path(), ScannerConfig::default());
    assert_eq!(groups(&events).len(), 1);

    let config = ScannerConfig::default().with_walker_config(WalkerConfig::new(true));
    let (events, summary) = scan(dir.path(), config);
    assert!(groups(&events).is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_scan_progress_strictly_increasing() {
    let dir = tempdir().unwrap();
    for i in 0..40u8 {
        let content = vec![b'a' + (i % 7); usize::from(i) + 1];
        fs::write(dir.path().join(format!("f{i:02}")), content).unwrap();
        if i % 3 == 0 {
            let copy = vec![b'a' + (i % 7); usize::from(i) + 1];
            fs::write(dir.path().join(format!("g{i:02}")), copy).unwrap();
        }
    }

    let (events, _) = scan(dir.path(), ScannerConfig::default());
    let progress = percentages(&events);

    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
    assert!(progress.iter().all(|p| *p <= 100));
    assert_eq!(progress.last(), Some(&100));
}

#[test]
fn test_scan_finished_exactly_once_and_last() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "dup").unwrap();
    fs::write(dir.path().join("b"), "dup").unwrap();

    let (events, _) = scan(dir.path(), ScannerConfig::default());

    let finished: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, ScanEvent::Finished(_)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(finished, vec![events.len() - 1]);
}

#[test]
fn test_scan_invalid_roots_produce_no_events() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, "not a dir").unwrap();
    let scanner = DuplicateScanner::with_defaults();
    let token = CancellationToken::new();

    for (root, expect_not_found) in [(dir.path().join("nope"), true), (file.clone(), false)] {
        let mut events = Vec::new();
        let err = scanner.scan(&root, &token, &mut events).unwrap_err();
        assert!(events.is_empty());
        assert_eq!(matches!(err, FinderError::PathNotFound(_)), expect_not_found);
    }

    let mut events = Vec::new();
    let err = scanner
        .scan(&PathBuf::new(), &token, &mut events)
        .unwrap_err();
    assert!(matches!(err, FinderError::EmptyPath));
    assert!(events.is_empty());
}

#[cfg(unix)]
#[test]
fn test_scan_symlink_to_file_joins_group() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("real"), "linked content").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias")).unwrap();

    let (events, _) = scan(dir.path(), ScannerConfig::default());

    let found = groups(&events);
    assert_eq!(found.len(), 1);
    assert_eq!(names(&found[0]), vec!["alias", "real"]);
}

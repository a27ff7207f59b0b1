use dupescan::duplicates::{FinderError, ScanEvent, ScannerConfig};
use dupescan::signal::CancellationToken;
use dupescan::worker::start_scan;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_worker_streams_groups_then_finished() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "X").unwrap();
    fs::write(dir.path().join("b"), "X").unwrap();
    fs::write(dir.path().join("c"), "Y").unwrap();

    let handle = start_scan(dir.path(), ScannerConfig::default(), CancellationToken::new()).unwrap();
    let events: Vec<ScanEvent> = handle.events().collect();

    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], ScanEvent::Duplicates(_)));
    assert!(matches!(events[1], ScanEvent::Progress(66)));
    assert!(matches!(events[2], ScanEvent::Progress(100)));
    assert!(matches!(events[3], ScanEvent::Finished(_)));
    assert!(handle.wait().is_some());
}

#[test]
fn test_worker_startup_failure_is_synchronous() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    fs::write(&file, "x").unwrap();

    let err = start_scan(&file, ScannerConfig::default(), CancellationToken::new()).unwrap_err();
    assert!(matches!(err, FinderError::NotADirectory(_)));
}

#[test]
fn test_worker_cancel_through_handle() {
    let dir = tempdir().unwrap();
    for i in 1..=100 {
        let content = "w".repeat(i);
        fs::write(dir.path().join(format!("{i:03}a")), &content).unwrap();
        fs::write(dir.path().join(format!("{i:03}b")), &content).unwrap();
    }

    let handle = start_scan(dir.path(), ScannerConfig::default(), CancellationToken::new()).unwrap();
    handle.cancel();

    let events: Vec<ScanEvent> = handle.events().collect();
    let finished = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::Finished(_)))
        .count();
    assert_eq!(finished, 1);
    assert!(matches!(events.last(), Some(ScanEvent::Finished(_))));
    assert!(handle.token().is_cancelled());
}

#[test]
fn test_worker_receiver_timeout_api() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only"), "single").unwrap();

    let handle = start_scan(dir.path(), ScannerConfig::default(), CancellationToken::new()).unwrap();

    let mut saw_finished = false;
    while let Ok(event) = handle.receiver().recv_timeout(Duration::from_secs(10)) {
        if let ScanEvent::Finished(summary) = event {
            assert_eq!(summary.unique_files, 1);
            saw_finished = true;
        }
    }
    assert!(saw_finished);

    // Worker is done once the channel disconnects
    let summary = handle.wait().unwrap();
    assert_eq!(summary.total_files, 1);
}

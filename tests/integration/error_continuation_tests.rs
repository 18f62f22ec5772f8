use dupefind::duplicates::{DuplicateFinder, FinderConfig, FinderError, InvalidRootReason};
use dupefind::progress::ProgressCallback;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::tempdir;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Deletes a file as soon as the counting pass finishes.
struct DeleteAfterCount {
    victim: PathBuf,
}

impl ProgressCallback for DeleteAfterCount {
    fn on_count_complete(&self, _total: usize) {
        fs::remove_file(&self.victim).unwrap();
    }

    fn on_progress(&self, _processed: usize, _total: usize) {}
}

#[test]
fn test_regular_file_root_is_invalid() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    fs::write(&file, b"not a dir").unwrap();

    match dupefind::scan(&file, None) {
        Err(FinderError::InvalidRoot { path, reason }) => {
            assert_eq!(path, file);
            assert_eq!(reason, InvalidRootReason::NotADirectory);
        }
        other => panic!("Expected InvalidRoot, got {:?}", other),
    }
}

#[test]
fn test_missing_root_is_invalid() {
    let dir = tempdir().unwrap();
    let err = dupefind::scan(&dir.path().join("gone"), None).unwrap_err();
    assert!(matches!(
        err,
        FinderError::InvalidRoot {
            reason: InvalidRootReason::NotFound,
            ..
        }
    ));
}

#[test]
fn test_file_deleted_between_passes_is_excluded() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    fs::write(&a, b"shared").unwrap();
    fs::write(&b, b"shared").unwrap();
    fs::write(&c, b"shared").unwrap();

    for threads in [1, 4] {
        fs::write(&b, b"shared").unwrap();
        let config = FinderConfig::default()
            .with_io_threads(threads)
            .with_progress_callback(Arc::new(DeleteAfterCount { victim: b.clone() }));

        let (result, summary) = DuplicateFinder::new(config)
            .find_duplicates(dir.path())
            .unwrap();

        // The hashing pass lists the directory afresh and never sees b.txt
        assert_eq!(summary.total_files, 3);
        assert_eq!(result.len(), 1);
        assert_eq!(result.groups()[0].files, vec![a.clone(), c.clone()]);
        assert_eq!(summary.processed_files, 2);
        assert_eq!(summary.hashed_files, 2);
        assert_eq!(summary.unreadable_files, 0);
        assert!(!summary.had_errors());
    }
}

#[test]
fn test_file_deleted_after_listing_is_unreadable() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    fs::write(&a, b"shared").unwrap();
    fs::write(&b, b"shared").unwrap();
    fs::write(&c, b"shared").unwrap();

    // The sorted walk has already read the directory when a.txt is hashed,
    // so c.txt is still yielded and fails to open.
    let victim = c.clone();
    let callback: Arc<dyn ProgressCallback> = Arc::new(move |processed: usize, _: usize| {
        if processed == 1 {
            fs::remove_file(&victim).unwrap();
        }
    });
    let config = FinderConfig::default()
        .with_io_threads(1)
        .with_progress_callback(callback);

    let (result, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.processed_files, 3);
    assert_eq!(summary.hashed_files, 2);
    assert_eq!(summary.unreadable_files, 1);
    assert_eq!(result.groups()[0].files, vec![a, b]);
    assert!(result.group_of(&c).is_none());
}

#[cfg(unix)]
#[test]
fn test_empty_and_unreadable_files() {
    let dir = tempdir().unwrap();
    let empty = dir.path().join("empty.txt");
    let locked = dir.path().join("locked.txt");
    fs::write(&empty, b"").unwrap();
    fs::write(&locked, b"secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read(&locked).is_ok() {
        // Running with privileges that bypass file permissions
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let (result, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert!(result.is_empty());
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.processed_files, 2);
    assert_eq!(summary.hashed_files, 1);
    assert_eq!(summary.unreadable_files, 1);
}

#[cfg(unix)]
#[test]
fn test_unlistable_directory_is_skipped() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, b"dup").unwrap();
    fs::write(&b, b"dup").unwrap();

    let sealed = dir.path().join("sealed");
    fs::create_dir(&sealed).unwrap();
    fs::write(sealed.join("c.txt"), b"dup").unwrap();
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&sealed).is_ok() {
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let outcome = DuplicateFinder::with_defaults().find_duplicates(dir.path());
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();

    let (result, summary) = outcome.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.groups()[0].files, vec![a, b]);
    assert!(summary.walk_errors >= 1);
    assert!(summary.had_errors());
}

#[test]
fn test_cancelled_scan_returns_no_result() {
    let dir = tempdir().unwrap();
    for i in 0..25 {
        fs::write(dir.path().join(format!("{i}.txt")), b"same").unwrap();
    }

    let token = dupefind::signal::CancellationToken::new();
    let trip = token.clone();
    let callback: Arc<dyn ProgressCallback> = Arc::new(move |processed: usize, _: usize| {
        if processed == 3 {
            trip.cancel();
        }
    });

    let config = FinderConfig::default()
        .with_cancellation(token)
        .with_progress_callback(callback);
    let err = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap_err();

    assert!(err.is_cancelled());
}

use dupefind::duplicates::{DuplicateFinder, FinderConfig};
use dupefind::progress::ProgressCallback;
use dupefind::scanner::WalkerConfig;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn write(root: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"content a");
    write(dir.path(), "b.txt", b"content b");
    write(dir.path(), "c.txt", b"content c");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.hashed_files, 3);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_hello_world_scenario() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"hello");
    let b = write(dir.path(), "b.txt", b"hello");
    let c = write(dir.path(), "c.txt", b"world");

    let result = dupefind::scan(dir.path(), None).unwrap();

    assert_eq!(result.len(), 1);
    let group = &result.groups()[0];
    assert_eq!(group.files, vec![a, b]);
    assert!(result.group_of(&c).is_none());
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let top = write(dir.path(), "a.txt", b"nested dup");
    let deep = write(dir.path(), "x/y/z/b.txt", b"nested dup");
    let mid = write(dir.path(), "x/c.txt", b"nested dup");
    write(dir.path(), "x/y/other.txt", b"other");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.total_files, 4);
    assert_eq!(groups.len(), 1);
    // Traversal is sorted by file name at every level
    assert_eq!(groups.groups()[0].files, vec![top, mid, deep]);
}

#[test]
fn test_scan_groups_in_first_occurrence_order() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a1.txt", b"AAA");
    write(dir.path(), "b1.txt", b"BBB");
    write(dir.path(), "b2.txt", b"BBB");
    write(dir.path(), "c1.txt", b"AAA");

    let result = dupefind::scan(dir.path(), None).unwrap();
    let firsts: Vec<_> = result
        .iter()
        .map(|g| g.first().unwrap().file_name().unwrap().to_owned())
        .collect();

    assert_eq!(firsts, vec!["a1.txt", "b1.txt"]);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..30 {
        write(
            dir.path(),
            &format!("dir{}/file{}.dat", i % 3, i),
            format!("payload {}", i % 5).as_bytes(),
        );
    }

    let first = dupefind::scan(dir.path(), None).unwrap();
    let second = dupefind::scan(dir.path(), None).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[test]
fn test_thread_count_does_not_change_result() {
    let dir = tempdir().unwrap();
    for i in 0..120 {
        let content = vec![(i % 11) as u8; 1000 + (i % 11) * 37];
        write(dir.path(), &format!("t{}/f{:03}", i % 7, i), &content);
    }

    let reference = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
        .find_duplicates(dir.path())
        .unwrap()
        .0;

    for threads in [2, 3, 8, 16] {
        let result = DuplicateFinder::new(FinderConfig::default().with_io_threads(threads))
            .find_duplicates(dir.path())
            .unwrap()
            .0;
        assert_eq!(result, reference, "io_threads = {}", threads);
    }
}

#[test]
fn test_small_buffer_matches_default_buffer() {
    let dir = tempdir().unwrap();
    let big: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
    write(dir.path(), "one.bin", &big);
    write(dir.path(), "two.bin", &big);

    let tiny = DuplicateFinder::new(FinderConfig::default().with_buffer_size(7))
        .find_duplicates(dir.path())
        .unwrap()
        .0;
    let default = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap()
        .0;

    assert_eq!(tiny, default);
    assert_eq!(tiny.len(), 1);
}

#[test]
fn test_scan_skip_hidden() {
    let dir = tempdir().unwrap();
    write(dir.path(), "visible.txt", b"same");
    write(dir.path(), ".hidden.txt", b"same");
    write(dir.path(), ".git/objects/blob", b"same");

    let shown = dupefind::scan(dir.path(), None).unwrap();
    assert_eq!(shown.groups()[0].len(), 3);

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_skip_hidden(true));
    let (hidden, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    assert!(hidden.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_scan_ignore_patterns() {
    let dir = tempdir().unwrap();
    write(dir.path(), "keep_a.txt", b"same");
    write(dir.path(), "keep_b.txt", b"same");
    write(dir.path(), "drop.tmp", b"same");
    write(dir.path(), "node_modules/pkg/index.js", b"same");

    let config = FinderConfig::default().with_walker_config(
        WalkerConfig::default()
            .with_ignore_patterns(vec!["*.tmp".to_string(), "node_modules/".to_string()]),
    );
    let (result, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(result.groups()[0].len(), 2);
}

#[test]
fn test_progress_reaches_total_and_never_decreases() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        write(dir.path(), &format!("f{:02}", i), format!("{}", i % 4).as_bytes());
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: Arc<dyn ProgressCallback> = Arc::new(move |processed: usize, total: usize| {
        sink.lock().unwrap().push((processed, total));
    });

    dupefind::scan(dir.path(), Some(callback)).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 40);
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    assert!(seen.iter().all(|&(_, total)| total == 40));
    assert_eq!(seen.last(), Some(&(40, 40)));
}

#[test]
fn test_paths_are_joined_onto_root() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"rel");
    write(dir.path(), "b.txt", b"rel");

    let result = dupefind::scan(dir.path(), None).unwrap();
    for path in &result.groups()[0].files {
        assert!(path.starts_with(dir.path()));
    }
}

#[cfg(unix)]
#[test]
fn test_symlinks_not_followed_by_default() {
    let dir = tempdir().unwrap();
    let target = write(dir.path(), "real.txt", b"linked");
    std::os::unix::fs::symlink(&target, dir.path().join("alias.txt")).unwrap();

    let default = dupefind::scan(dir.path(), None).unwrap();
    assert!(default.is_empty());

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_follow_symlinks(true));
    let (followed, _) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(followed.len(), 1);
    assert_eq!(followed.groups()[0].len(), 2);
}

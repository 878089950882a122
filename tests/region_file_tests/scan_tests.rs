//! Tests for directory discovery
//!
//! These tests verify:
//! - File name parsing
//! - Classification of complete and unpaired files
//! - Detection of a torn rename

use std::fs;
use std::path::PathBuf;

use regionfile::region_file::{parse_file_name, scan_dir, DirScan, FileKind};
use regionfile::{RawRegion, RegionFile};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn write_pair(dir: &PathBuf, file_id: u64) -> RegionFile {
    let mut file = RegionFile::new(file_id, dir);
    file.append(&[RawRegion::new(file_id, "payload")]).unwrap();
    file
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_parse_file_names() {
    assert_eq!(parse_file_name("42.rgn"), Some((42, FileKind::Data)));
    assert_eq!(parse_file_name("42.rgn.idx"), Some((42, FileKind::Index)));
    assert_eq!(parse_file_name("0.rgn"), Some((0, FileKind::Data)));
}

#[test]
fn test_parse_rejects_other_names() {
    assert_eq!(parse_file_name("abc.rgn"), None);
    assert_eq!(parse_file_name("42.sst"), None);
    assert_eq!(parse_file_name(".rgn"), None);
    assert_eq!(parse_file_name("42.rgn.tmp"), None);
}

// =============================================================================
// Scan Tests
// =============================================================================

#[test]
fn test_scan_empty_dir() {
    let (_temp, dir) = setup_temp_dir();

    let scan = scan_dir(&dir).unwrap();

    assert_eq!(scan, DirScan::default());
    assert!(scan.is_consistent());
    assert_eq!(scan.max_file_id(), None);
}

#[test]
fn test_scan_complete_pairs_sorted() {
    let (_temp, dir) = setup_temp_dir();
    for id in [10, 2, 7] {
        write_pair(&dir, id);
    }
    fs::write(dir.join("notes.txt"), b"ignored").unwrap();
    fs::create_dir(dir.join("5.rgn")).unwrap(); // directories ignored

    let scan = scan_dir(&dir).unwrap();

    assert_eq!(scan.complete, vec![2, 7, 10]);
    assert!(scan.is_consistent());
    assert_eq!(scan.max_file_id(), Some(10));
}

#[test]
fn test_scan_reports_unpaired_files() {
    let (_temp, dir) = setup_temp_dir();
    let a = write_pair(&dir, 1);
    let b = write_pair(&dir, 2);
    write_pair(&dir, 3);
    fs::remove_file(a.index_path()).unwrap();
    fs::remove_file(b.data_path()).unwrap();

    let scan = scan_dir(&dir).unwrap();

    assert_eq!(scan.complete, vec![3]);
    assert_eq!(scan.data_only, vec![1]);
    assert_eq!(scan.index_only, vec![2]);
    assert!(!scan.is_consistent());
}

#[test]
fn test_scan_detects_torn_rename() {
    let (_temp, dir) = setup_temp_dir();
    let file = write_pair(&dir, 4);

    // index renamed, crash before the data file followed
    fs::rename(file.index_path(), file.index_path_for(9)).unwrap();

    let scan = scan_dir(&dir).unwrap();
    assert_eq!(scan.data_only, vec![4]);
    assert_eq!(scan.index_only, vec![9]);
    assert_eq!(scan.max_file_id(), Some(9));
}

#[test]
fn test_scan_missing_dir_fails() {
    let (_temp, dir) = setup_temp_dir();
    assert!(scan_dir(&dir.join("missing")).is_err());
}

//! Tests for RegionFileWriter
//!
//! These tests verify:
//! - Appending regions to the data file and index file
//! - file_size bookkeeping across sessions
//! - Sync policies
//! - Durability at scope end (finish and drop)
//! - Failed writes leave file_size alone

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use regionfile::config::IoOptions;
use regionfile::region_file::{decode_all, INDEX_ENTRY_SIZE};
use regionfile::{
    RawRegion, Region, RegionError, RegionFile, RegionSnapshot, Result, SyncPolicy,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn index_entries(file: &RegionFile) -> Vec<(u64, u64)> {
    let bytes = fs::read(file.index_path()).unwrap();
    decode_all(&file.index_path(), &bytes)
        .unwrap()
        .into_iter()
        .map(|e| (e.region_id, e.region_size))
        .collect()
}

/// Region whose serializer reports a wrong size
struct LyingRegion;

impl Region for LyingRegion {
    fn id(&self) -> u64 {
        9
    }

    fn serialize<W: Write>(&self, writer: &mut W) -> Result<u64> {
        writer.write_all(b"xyz")?;
        Ok(100)
    }

    fn deserialize<R: std::io::Read>(_id: u64, _reader: &mut R) -> Result<Self> {
        Ok(LyingRegion)
    }
}

/// Region whose serializer fails after writing part of its payload
struct FailingRegion;

impl Region for FailingRegion {
    fn id(&self) -> u64 {
        13
    }

    fn serialize<W: Write>(&self, writer: &mut W) -> Result<u64> {
        writer.write_all(b"partial")?;
        Err(RegionError::Serialization("encoder gave up".to_string()))
    }

    fn deserialize<R: std::io::Read>(_id: u64, _reader: &mut R) -> Result<Self> {
        Ok(FailingRegion)
    }
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_write_single_region() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);

    let mut writer = file.writer().unwrap();
    let size = writer.write(&RawRegion::new(1, "AAAA")).unwrap();
    writer.finish().unwrap();

    assert_eq!(size, 4);
    assert_eq!(file.file_size(), 4);
    assert_eq!(fs::read(file.data_path()).unwrap(), b"AAAA");
    assert_eq!(index_entries(&file), vec![(1, 4)]);
}

#[test]
fn test_write_does_not_touch_liveness() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);

    let mut writer = file.writer().unwrap();
    writer.write(&RawRegion::new(1, "AAAA")).unwrap();
    writer.finish().unwrap();

    assert_eq!(file.region_count(), 0);
}

#[test]
fn test_write_multiple_regions_in_order() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(3, &dir);

    let mut writer = file.writer().unwrap();
    let sizes: Vec<u64> = [(5u64, "a"), (2, "bb"), (9, "ccc")]
        .iter()
        .map(|(id, p)| writer.write(&RawRegion::new(*id, *p)).unwrap())
        .collect();
    assert_eq!(writer.regions_written(), 3);
    writer.finish().unwrap();

    assert_eq!(sizes, vec![1, 2, 3]);
    assert_eq!(file.file_size(), 6);
    assert_eq!(index_entries(&file), vec![(5, 1), (2, 2), (9, 3)]);
}

#[test]
fn test_index_length_is_multiple_of_entry_size() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);

    let regions: Vec<RawRegion> = (0..10)
        .map(|i| RawRegion::new(i, vec![b'x'; i as usize]))
        .collect();
    file.append(&regions).unwrap();

    let len = fs::metadata(file.index_path()).unwrap().len() as usize;
    assert_eq!(len, 10 * INDEX_ENTRY_SIZE);
}

#[test]
fn test_empty_payload_region() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);

    file.append(&[RawRegion::new(4, "")]).unwrap();

    assert_eq!(file.file_size(), 0);
    assert_eq!(index_entries(&file), vec![(4, 0)]);
    assert_eq!(file.region_size(4), Some(0));
}

// =============================================================================
// Session Tests
// =============================================================================

#[test]
fn test_sessions_append_not_truncate() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);

    file.append(&[RawRegion::new(1, "AAAA")]).unwrap();
    file.append(&[RawRegion::new(2, "BBBBBB")]).unwrap();

    assert_eq!(file.file_size(), 10);
    assert_eq!(fs::read(file.data_path()).unwrap(), b"AAAABBBBBB");
    assert_eq!(index_entries(&file), vec![(1, 4), (2, 6)]);
}

#[test]
fn test_append_takes_ownership() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);

    let appended = file
        .append(&[RawRegion::new(1, "AAAA"), RawRegion::new(2, "BB")])
        .unwrap();

    assert_eq!(appended, 6);
    assert_eq!(file.region_size(1), Some(4));
    assert_eq!(file.region_size(2), Some(2));
}

#[test]
fn test_liveness_updates_during_session() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);
    file.add_region(3, 10);

    let mut writer = file.writer().unwrap();
    let size = writer.write(&RawRegion::new(8, "hello")).unwrap();
    assert!(!writer.add_region(8, size));
    assert!(writer.add_region(8, size));
    assert!(writer.drop_region(3));
    assert!(!writer.drop_region(3));
    assert_eq!(writer.file().file_size(), 5);
    assert_eq!(writer.file().region_size(8), Some(5));
    writer.finish().unwrap();

    assert!(file.contains_region(8));
    assert!(!file.contains_region(3));
    assert_eq!(file.region_count(), 1);
}

#[test]
fn test_drop_flushes_unfinished_writer() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);

    {
        let mut writer = file.writer().unwrap();
        writer.write(&RawRegion::new(1, "AAAA")).unwrap();
        // no finish(): Drop must flush
    }

    assert_eq!(fs::read(file.data_path()).unwrap(), b"AAAA");
    assert_eq!(index_entries(&file), vec![(1, 4)]);
}

#[test]
fn test_sync_every_write_visible_before_close() {
    let (_temp, dir) = setup_temp_dir();
    let options = IoOptions {
        sync_policy: SyncPolicy::EveryWrite,
        ..IoOptions::default()
    };
    let mut file = RegionFile::with_options(1, &dir, options);
    let data_path = file.data_path();
    let index_path = file.index_path();

    let mut writer = file.writer().unwrap();
    writer.write(&RawRegion::new(1, "AAAA")).unwrap();

    assert_eq!(fs::read(&data_path).unwrap(), b"AAAA");
    assert_eq!(fs::metadata(&index_path).unwrap().len(), INDEX_ENTRY_SIZE as u64);

    writer.finish().unwrap();
}

#[test]
fn test_counted_size_wins_over_reported() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);

    let mut writer = file.writer().unwrap();
    let size = writer.write(&LyingRegion).unwrap();
    writer.finish().unwrap();

    assert_eq!(size, 3);
    assert_eq!(index_entries(&file), vec![(9, 3)]);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_failed_serialize_leaves_file_size() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);

    let mut writer = file.writer().unwrap();
    writer.write(&RawRegion::new(1, "AAAA")).unwrap();

    let result = writer.write(&FailingRegion);
    assert!(matches!(result, Err(RegionError::Serialization(_))));
    assert_eq!(writer.file().file_size(), 4);
    assert_eq!(writer.regions_written(), 1);
    writer.finish().unwrap();

    assert_eq!(file.file_size(), 4);
    assert!(!file.contains_region(13));

    // the partial payload reached the data file but was never indexed
    assert_eq!(fs::read(file.data_path()).unwrap(), b"AAAApartial");
    assert_eq!(index_entries(&file), vec![(1, 4)]);

    let reader = file.reader().unwrap();
    assert_eq!(reader.indexed_bytes(), Some(4));
    assert_eq!(fs::metadata(file.data_path()).unwrap().len(), 11);
}

#[test]
fn test_write_snapshot_region() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, &dir);

    let snapshot = RegionSnapshot::new(11, 3, b"state".to_vec());
    let expected = snapshot.encode().unwrap().len() as u64;

    file.append(&[snapshot]).unwrap();

    assert_eq!(file.file_size(), expected);
    assert_eq!(index_entries(&file), vec![(11, expected)]);
}

#[test]
fn test_writer_missing_parent_fails() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = RegionFile::new(1, dir.join("does_not_exist"));

    assert!(file.writer().is_err());
}

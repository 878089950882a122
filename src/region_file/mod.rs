//! Region File Module
//!
//! One data file plus one index file, and the in-memory record of which
//! regions this pair still owns.
//!
//! ## File Format
//! ```text
//! {parent}/{file_id}.rgn.idx  (index, no header)
//! ┌─────────────────────────────────────────────────────────┐
//! │ RegionId: u64 (8) | RegionSize: u64 (8) | Reserved (8)  │
//! │ ... repeated, one per write, little-endian ...          │
//! └─────────────────────────────────────────────────────────┘
//!
//! {parent}/{file_id}.rgn      (data, no header)
//! ┌─────────────────────────────────────────────────────────┐
//! │ [region payload][region payload] ...                    │
//! │ (boundaries come from RegionSize, in index order)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership Across Files
//! The same region ID may be written to several files over time. At most one
//! file's `regions` map holds it: `try_cover_region` resolves conflicts with
//! "larger file ID wins", since file IDs are handed out in write order.
//! Losing a region never reclaims bytes; `use_rate` exposes the dead share so
//! a compaction policy can pick victims.
//!
//! ## Multi-file Operations
//! `destroy` and `reset_id` touch two files without a journal. A failure
//! between the two steps leaves a half-done pair, visible via `pair_state`
//! and `scan_dir`.

mod codec;
mod reader;
mod scan;
mod writer;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{Config, IoOptions};
use crate::error::Result;
use crate::region::{Region, RegionId};

pub use codec::{decode_all, IndexEntry};
pub use reader::{ReaderMeta, ReaderPosition, RegionFileReader, RegionIter};
pub use scan::{parse_file_name, scan_dir, DirScan, FileKind};
pub use writer::RegionFileWriter;

// =============================================================================
// Shared Constants (used by codec, writer, reader, scan)
// =============================================================================

/// Index entry size: RegionId (8) + RegionSize (8) + Reserved (8) = 24 bytes
pub const INDEX_ENTRY_SIZE: usize = 24;

/// Suffix of data files
pub const DATA_SUFFIX: &str = ".rgn";

/// Suffix of index files
pub const INDEX_SUFFIX: &str = ".rgn.idx";

// =============================================================================
// Pair State
// =============================================================================

/// Which of the two files currently exist on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePairState {
    /// Both data and index file exist
    Complete,
    /// Only the data file exists
    DataOnly,
    /// Only the index file exists
    IndexOnly,
    /// Neither file exists (never written, or destroyed)
    Missing,
}

// =============================================================================
// Region File
// =============================================================================

/// A data/index file pair and the regions it currently owns
#[derive(Debug)]
pub struct RegionFile {
    file_id: u64,
    parent_path: PathBuf,
    /// Bytes appended to the data file; never lowered by ownership loss
    file_size: u64,
    /// Liveness index: region ID → size of the copy this file owns
    regions: HashMap<RegionId, u64>,
    io: IoOptions,
}

impl RegionFile {
    /// Create a handle for `file_id` under `parent_path`
    ///
    /// Touches nothing on disk; files are created by the first writer.
    pub fn new(file_id: u64, parent_path: impl Into<PathBuf>) -> Self {
        Self::with_options(file_id, parent_path, IoOptions::default())
    }

    pub fn with_options(file_id: u64, parent_path: impl Into<PathBuf>, io: IoOptions) -> Self {
        Self {
            file_id,
            parent_path: parent_path.into(),
            file_size: 0,
            regions: HashMap::new(),
            io,
        }
    }

    /// Create a handle rooted at `config.data_dir`
    pub fn from_config(file_id: u64, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_options(
            file_id,
            config.data_dir.clone(),
            config.io_options(),
        ))
    }

    /// Reopen an existing pair after a restart
    ///
    /// `file_size` comes from the data file length and `regions` is rebuilt
    /// from the index (a later entry for an ID replaces an earlier one).
    /// Ownership against other files must be settled again by the caller.
    /// A pair that was never written opens empty.
    pub fn open_existing(file_id: u64, parent_path: impl Into<PathBuf>) -> Result<Self> {
        let mut file = Self::new(file_id, parent_path);
        file.load()?;
        Ok(file)
    }

    fn load(&mut self) -> Result<()> {
        self.file_size = match fs::metadata(self.data_path()) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let index_path = self.index_path();
        let index_bytes = match fs::read(&index_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        self.regions.clear();
        for entry in codec::decode_all(&index_path, &index_bytes)? {
            self.regions.insert(entry.region_id, entry.region_size);
        }

        tracing::debug!(
            file_id = self.file_id,
            file_size = self.file_size,
            regions = self.regions.len(),
            "loaded region file"
        );
        Ok(())
    }

    // =========================================================================
    // Readers and Writers
    // =========================================================================

    /// Open an append session
    pub fn writer(&mut self) -> Result<RegionFileWriter<'_>> {
        RegionFileWriter::open(self)
    }

    /// Open an independent snapshot reader
    pub fn reader(&self) -> Result<RegionFileReader> {
        RegionFileReader::open(self)
    }

    /// Write `regions` in one session, taking ownership of each
    ///
    /// Returns the bytes appended.
    pub fn append<'r, R, I>(&mut self, regions: I) -> Result<u64>
    where
        R: Region + 'r,
        I: IntoIterator<Item = &'r R>,
    {
        let mut writer = self.writer()?;
        let mut appended = 0;
        for region in regions {
            let size = writer.write(region)?;
            writer.add_region(region.id(), size);
            appended += size;
        }
        writer.finish()?;
        Ok(appended)
    }

    /// Decode the copies this file still owns, in write order
    ///
    /// Only the last copy of an owned ID is decoded; superseded copies and
    /// IDs owned elsewhere are skipped without decoding.
    pub fn read_live<R: Region>(&self) -> Result<Vec<R>> {
        let mut reader = self.reader()?;

        let mut last_copy: HashMap<RegionId, usize> = HashMap::new();
        for (pos, meta) in reader.metas().iter().enumerate() {
            last_copy.insert(meta.region_id, pos);
        }

        let mut live = Vec::with_capacity(self.regions.len());
        while let Some(region_id) = reader.has_next() {
            let pos = reader.position().index;
            let is_live =
                self.regions.contains_key(&region_id) && last_copy.get(&region_id) == Some(&pos);

            if is_live {
                live.push(reader.next_region::<R>()?);
            } else {
                reader.skip_next()?;
            }
        }
        Ok(live)
    }

    // =========================================================================
    // Liveness Index
    // =========================================================================

    /// Record that this file owns `region_id` at `region_size` bytes
    ///
    /// Returns whether the ID was already owned here.
    pub fn add_region(&mut self, region_id: RegionId, region_size: u64) -> bool {
        self.regions.insert(region_id, region_size).is_some()
    }

    /// Give up ownership of `region_id`
    ///
    /// Returns whether the ID was owned here.
    pub fn drop_region(&mut self, region_id: RegionId) -> bool {
        self.regions.remove(&region_id).is_some()
    }

    /// Settle ownership of `region_id` between this file and `other`
    ///
    /// - same file ID: nothing to settle, returns `true`
    /// - `other` does not own the ID: returns `true`
    /// - both own it: the larger file ID keeps it and the loser forgets it.
    ///   Returns `true` if this file won, `false` if it lost.
    pub fn try_cover_region(&mut self, region_id: RegionId, other: &mut RegionFile) -> bool {
        if other.file_id == self.file_id {
            return true;
        }
        if !other.regions.contains_key(&region_id) {
            return true;
        }

        if other.file_id > self.file_id {
            self.regions.remove(&region_id);
            tracing::debug!(
                region_id,
                winner = other.file_id,
                loser = self.file_id,
                "region covered by newer file"
            );
            false
        } else {
            other.regions.remove(&region_id);
            tracing::debug!(
                region_id,
                winner = self.file_id,
                loser = other.file_id,
                "region covered by newer file"
            );
            true
        }
    }

    /// Fraction of `file_size` held by owned regions
    ///
    /// `0.0` for a file with nothing appended.
    pub fn use_rate(&self) -> f64 {
        if self.file_size == 0 {
            return 0.0;
        }
        self.live_bytes() as f64 / self.file_size as f64
    }

    /// Sum of the sizes of owned regions
    pub fn live_bytes(&self) -> u64 {
        self.regions.values().sum()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Delete both files and reset in-memory state
    ///
    /// Missing files are not an error, so calling it twice is fine. The two
    /// deletions are not atomic.
    pub fn destroy(&mut self) -> Result<()> {
        remove_if_exists(&self.index_path())?;
        remove_if_exists(&self.data_path())?;

        tracing::info!(
            file_id = self.file_id,
            dropped_regions = self.regions.len(),
            file_size = self.file_size,
            "destroyed region file"
        );

        self.regions.clear();
        self.file_size = 0;
        Ok(())
    }

    /// Rename both files to `new_file_id` and adopt it
    ///
    /// Files that do not exist are skipped. Refuses up front if either
    /// destination already exists. The two renames are not atomic: on a
    /// failure between them the file keeps its old ID and `pair_state`
    /// reports the torn pair.
    pub fn reset_id(&mut self, new_file_id: u64) -> Result<()> {
        if new_file_id == self.file_id {
            return Ok(());
        }

        let moves = [
            (self.index_path(), self.index_path_for(new_file_id)),
            (self.data_path(), self.data_path_for(new_file_id)),
        ];

        for (_, to) in &moves {
            if to.exists() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("rename target {} already exists", to.display()),
                )
                .into());
            }
        }

        for (from, to) in &moves {
            if from.exists() {
                fs::rename(from, to)?;
            }
        }

        tracing::info!(
            old_file_id = self.file_id,
            new_file_id,
            "renamed region file"
        );

        self.file_id = new_file_id;
        Ok(())
    }

    /// Which of the two files exist right now
    pub fn pair_state(&self) -> FilePairState {
        match (self.data_path().exists(), self.index_path().exists()) {
            (true, true) => FilePairState::Complete,
            (true, false) => FilePairState::DataOnly,
            (false, true) => FilePairState::IndexOnly,
            (false, false) => FilePairState::Missing,
        }
    }

    // =========================================================================
    // Paths
    // =========================================================================

    pub fn data_path(&self) -> PathBuf {
        self.data_path_for(self.file_id)
    }

    pub fn index_path(&self) -> PathBuf {
        self.index_path_for(self.file_id)
    }

    /// Data file path for any file ID under this file's parent
    pub fn data_path_for(&self, file_id: u64) -> PathBuf {
        data_path(&self.parent_path, file_id)
    }

    /// Index file path for any file ID under this file's parent
    pub fn index_path_for(&self, file_id: u64) -> PathBuf {
        index_path(&self.parent_path, file_id)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn file_id(&self) -> u64 {
        self.file_id
    }

    pub fn parent_path(&self) -> &Path {
        &self.parent_path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn io_options(&self) -> IoOptions {
        self.io
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn contains_region(&self, region_id: RegionId) -> bool {
        self.regions.contains_key(&region_id)
    }

    /// Size of the owned copy of `region_id`, if owned here
    pub fn region_size(&self, region_id: RegionId) -> Option<u64> {
        self.regions.get(&region_id).copied()
    }

    /// Owned regions as `(id, size)`, in no particular order
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, u64)> + '_ {
        self.regions.iter().map(|(&id, &size)| (id, size))
    }
}

/// `{parent}/{file_id}.rgn`
pub fn data_path(parent: &Path, file_id: u64) -> PathBuf {
    parent.join(format!("{}{}", file_id, DATA_SUFFIX))
}

/// `{parent}/{file_id}.rgn.idx`
pub fn index_path(parent: &Path, file_id: u64) -> PathBuf {
    parent.join(format!("{}{}", file_id, INDEX_SUFFIX))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

//! Directory discovery
//!
//! Finds region file pairs in a directory after a restart and reports the
//! ones a torn `destroy`/`reset_id` left unpaired.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

use super::{DATA_SUFFIX, INDEX_SUFFIX};

/// Which half of a pair a file name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Data,
    Index,
}

/// Result of scanning a directory, each list sorted ascending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirScan {
    /// IDs with both data and index file
    pub complete: Vec<u64>,
    /// IDs with only a data file
    pub data_only: Vec<u64>,
    /// IDs with only an index file
    pub index_only: Vec<u64>,
}

impl DirScan {
    /// True when every file found has its partner
    pub fn is_consistent(&self) -> bool {
        self.data_only.is_empty() && self.index_only.is_empty()
    }

    /// Largest file ID seen in any state
    pub fn max_file_id(&self) -> Option<u64> {
        [&self.complete, &self.data_only, &self.index_only]
            .iter()
            .filter_map(|ids| ids.last().copied())
            .max()
    }
}

/// Parse a region file name
/// "42.rgn" → Some((42, Data)), "42.rgn.idx" → Some((42, Index))
pub fn parse_file_name(name: &str) -> Option<(u64, FileKind)> {
    // index suffix first: it ends with the data suffix's text plus more
    if let Some(id) = name.strip_suffix(INDEX_SUFFIX) {
        return id.parse().ok().map(|id| (id, FileKind::Index));
    }
    let id = name.strip_suffix(DATA_SUFFIX)?;
    id.parse().ok().map(|id| (id, FileKind::Data))
}

/// Scan `dir` for region files
///
/// Names that do not parse are ignored. A missing directory is an error.
pub fn scan_dir(dir: &Path) -> Result<DirScan> {
    // id → (has data, has index)
    let mut seen: BTreeMap<u64, (bool, bool)> = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name();
        let Some((id, kind)) = name.to_str().and_then(parse_file_name) else {
            continue;
        };

        let slot = seen.entry(id).or_default();
        match kind {
            FileKind::Data => slot.0 = true,
            FileKind::Index => slot.1 = true,
        }
    }

    let mut scan = DirScan::default();
    for (id, state) in seen {
        match state {
            (true, true) => scan.complete.push(id),
            (true, false) => scan.data_only.push(id),
            (false, true) => scan.index_only.push(id),
            (false, false) => {}
        }
    }

    if !scan.is_consistent() {
        tracing::warn!(
            data_only = ?scan.data_only,
            index_only = ?scan.index_only,
            "found unpaired region files"
        );
    }
    Ok(scan)
}

//! Index entry framing
//!
//! Fixed-width, little-endian records. The data file has no framing of its
//! own: record boundaries come from the `region_size` column here.

use std::path::Path;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{RegionError, Result};
use crate::region::RegionId;

use super::INDEX_ENTRY_SIZE;

/// One on-disk index record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub region_id: RegionId,
    /// Bytes the record occupies in the data file
    pub region_size: u64,
    /// Always written as 0; kept for future metadata
    pub reserved: u64,
}

impl IndexEntry {
    pub fn new(region_id: RegionId, region_size: u64) -> Self {
        Self {
            region_id,
            region_size,
            reserved: 0,
        }
    }

    /// Append the 24-byte encoding to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(INDEX_ENTRY_SIZE);
        buf.put_u64_le(self.region_id);
        buf.put_u64_le(self.region_size);
        buf.put_u64_le(self.reserved);
    }

    pub fn encode(&self) -> [u8; INDEX_ENTRY_SIZE] {
        let mut buf = BytesMut::with_capacity(INDEX_ENTRY_SIZE);
        self.encode_into(&mut buf);

        let mut out = [0u8; INDEX_ENTRY_SIZE];
        out.copy_from_slice(&buf);
        out
    }

    /// Decode one entry from the front of `bytes`
    ///
    /// Fails with `TruncatedIndexEntry` when fewer than 24 bytes are
    /// available.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < INDEX_ENTRY_SIZE {
            return Err(RegionError::TruncatedIndexEntry {
                len: bytes.len(),
                expected: INDEX_ENTRY_SIZE,
            });
        }

        let mut buf = &bytes[..INDEX_ENTRY_SIZE];
        Ok(Self {
            region_id: buf.get_u64_le(),
            region_size: buf.get_u64_le(),
            reserved: buf.get_u64_le(),
        })
    }
}

/// Decode a whole index file image
///
/// `path` is only used to label the error when the image carries a torn
/// trailing record.
pub fn decode_all(path: &Path, bytes: &[u8]) -> Result<Vec<IndexEntry>> {
    if bytes.len() % INDEX_ENTRY_SIZE != 0 {
        return Err(RegionError::MalformedIndex {
            path: path.to_path_buf(),
            len: bytes.len() as u64,
        });
    }

    let mut entries = Vec::with_capacity(bytes.len() / INDEX_ENTRY_SIZE);
    for chunk in bytes.chunks_exact(INDEX_ENTRY_SIZE) {
        let entry = IndexEntry::decode(chunk)?;
        if entry.reserved != 0 {
            tracing::warn!(
                region_id = entry.region_id,
                reserved = entry.reserved,
                "index entry carries non-zero reserved field"
            );
        }
        entries.push(entry);
    }
    Ok(entries)
}

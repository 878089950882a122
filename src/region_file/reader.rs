//! Region File Reader
//!
//! Loads the whole index file at open, then walks the data file in index
//! order. A reader is a point-in-time snapshot: entries appended after it
//! opened are not visible to it.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::marker::PhantomData;

use crate::error::{RegionError, Result};
use crate::region::{Region, RegionId};

use super::codec;
use super::RegionFile;

/// In-memory projection of one index entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderMeta {
    pub region_id: RegionId,
    pub region_size: u64,
}

/// Reader position: next unread index entry and its byte offset in the
/// data file. Replaced as a whole on every advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderPosition {
    pub index: usize,
    pub offset: u64,
}

impl ReaderPosition {
    fn advance(self, region_size: u64) -> Self {
        Self {
            index: self.index + 1,
            offset: self.offset + region_size,
        }
    }
}

/// Sequential reader over one region file
pub struct RegionFileReader {
    file_id: u64,
    data: BufReader<File>,
    metas: Vec<ReaderMeta>,
    position: ReaderPosition,
}

impl RegionFileReader {
    pub(super) fn open(file: &RegionFile) -> Result<Self> {
        let index_path = file.index_path();
        let index_bytes = fs::read(&index_path)?;
        let metas = codec::decode_all(&index_path, &index_bytes)?
            .into_iter()
            .map(|entry| ReaderMeta {
                region_id: entry.region_id,
                region_size: entry.region_size,
            })
            .collect::<Vec<_>>();

        let data = File::open(file.data_path())?;

        tracing::debug!(
            file_id = file.file_id(),
            entries = metas.len(),
            "opened region file reader"
        );

        Ok(Self {
            file_id: file.file_id(),
            data: BufReader::with_capacity(file.io_options().buffer_size, data),
            metas,
            position: ReaderPosition::default(),
        })
    }

    /// Peek the ID of the next unread region
    ///
    /// Does not move the reader: repeated calls return the same ID until
    /// `next_region` or `skip_next` consumes it. `None` once every index
    /// entry has been consumed.
    pub fn has_next(&self) -> Option<RegionId> {
        self.peek_meta().map(|meta| meta.region_id)
    }

    /// Index entry of the next unread region
    pub fn peek_meta(&self) -> Option<ReaderMeta> {
        self.metas.get(self.position.index).copied()
    }

    /// Decode the next region and move past it
    pub fn next_region<R: Region>(&mut self) -> Result<R> {
        let meta = self.pending("next_region")?;
        let offset = self.position.offset;

        // region_size comes from disk; never size an allocation from it alone
        let capacity = meta.region_size.min(self.data.capacity() as u64) as usize;
        let mut bytes = Vec::with_capacity(capacity);
        let read = (&mut self.data)
            .take(meta.region_size)
            .read_to_end(&mut bytes);

        let actual = match read {
            Ok(n) => n as u64,
            Err(e) => {
                self.rewind()?;
                return Err(e.into());
            }
        };

        if actual < meta.region_size {
            // leave the stream where the position says
            self.rewind()?;
            return Err(RegionError::ShortRead {
                region_id: meta.region_id,
                offset,
                expected: meta.region_size,
                actual,
            });
        }

        // bytes are consumed from the stream; keep the position in step
        // even when decoding fails
        self.position = self.position.advance(meta.region_size);

        let corrupt = |reason: String| RegionError::CorruptRecord {
            region_id: meta.region_id,
            offset,
            reason,
        };

        let mut slice = bytes.as_slice();
        let region =
            R::deserialize(meta.region_id, &mut slice).map_err(|e| corrupt(e.to_string()))?;

        if !slice.is_empty() {
            return Err(corrupt(format!(
                "{} trailing bytes after decoded record",
                slice.len()
            )));
        }
        if region.id() != meta.region_id {
            return Err(corrupt(format!("decoded region id {}", region.id())));
        }

        Ok(region)
    }

    /// Move past the next region without decoding it
    pub fn skip_next(&mut self) -> Result<()> {
        let meta = self.pending("skip_next")?;
        let out_of_range = || RegionError::CorruptRecord {
            region_id: meta.region_id,
            offset: self.position.offset,
            reason: format!("region size {} out of range", meta.region_size),
        };
        let delta = i64::try_from(meta.region_size).map_err(|_| out_of_range())?;
        self.position
            .offset
            .checked_add(meta.region_size)
            .ok_or_else(out_of_range)?;

        self.data.seek_relative(delta)?;
        self.position = self.position.advance(meta.region_size);
        Ok(())
    }

    /// All index entries, in write order
    pub fn metas(&self) -> &[ReaderMeta] {
        &self.metas
    }

    pub fn position(&self) -> ReaderPosition {
        self.position
    }

    /// Entries not yet consumed
    pub fn remaining(&self) -> usize {
        self.metas.len() - self.position.index
    }

    /// Sum of every indexed region size, `None` if it overflows `u64`
    pub fn indexed_bytes(&self) -> Option<u64> {
        self.metas
            .iter()
            .try_fold(0u64, |total, meta| total.checked_add(meta.region_size))
    }

    pub fn file_id(&self) -> u64 {
        self.file_id
    }

    /// Decode every remaining region in order
    pub fn into_regions<R: Region>(self) -> RegionIter<R> {
        RegionIter {
            reader: self,
            failed: false,
            _marker: PhantomData,
        }
    }

    /// Put the data stream back at `position.offset`
    fn rewind(&mut self) -> Result<()> {
        self.data.seek(SeekFrom::Start(self.position.offset))?;
        Ok(())
    }

    fn pending(&self, op: &str) -> Result<ReaderMeta> {
        self.peek_meta().ok_or_else(|| {
            RegionError::Usage(format!(
                "{} called on region file {} with no regions left",
                op, self.file_id
            ))
        })
    }
}

/// Iterator over the remaining regions of a reader
///
/// Stops after the first error.
pub struct RegionIter<R> {
    reader: RegionFileReader,
    failed: bool,
    _marker: PhantomData<R>,
}

impl<R: Region> Iterator for RegionIter<R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.reader.has_next()?;

        let result = self.reader.next_region::<R>();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

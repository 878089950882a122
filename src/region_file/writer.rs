//! Region File Writer
//!
//! Appends regions to the data file and one index entry per region to the
//! index file. Both files are opened in append-create mode.
//!
//! ## Durability
//! Nothing is guaranteed durable until the writer scope ends: `finish()` (or
//! `Drop`, for writers that are not finished explicitly) flushes and fsyncs
//! the data file first, then the index file.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};

use bytes::BytesMut;

use crate::config::SyncPolicy;
use crate::error::Result;
use crate::region::{Region, RegionId};

use super::codec::IndexEntry;
use super::{RegionFile, INDEX_ENTRY_SIZE};

/// Append session over one region file
///
/// Holds the file mutably, so a process cannot open two writers against
/// the same `RegionFile` at once.
pub struct RegionFileWriter<'a> {
    /// The file whose `file_size` this session advances
    file: &'a mut RegionFile,
    data: BufWriter<File>,
    index: BufWriter<File>,
    /// Scratch buffer for encoding index entries
    index_buf: BytesMut,
    sync_policy: SyncPolicy,
    regions_written: u64,
    closed: bool,
}

impl<'a> RegionFileWriter<'a> {
    pub(super) fn open(file: &'a mut RegionFile) -> Result<Self> {
        let data_path = file.data_path();
        let index_path = file.index_path();
        let options = file.io_options();

        let data = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&data_path)?;
        let index = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&index_path)?;

        tracing::debug!(
            file_id = file.file_id(),
            file_size = file.file_size(),
            "opened region file writer"
        );

        Ok(Self {
            file,
            data: BufWriter::with_capacity(options.buffer_size, data),
            index: BufWriter::with_capacity(options.buffer_size, index),
            index_buf: BytesMut::with_capacity(INDEX_ENTRY_SIZE),
            sync_policy: options.sync_policy,
            regions_written: 0,
            closed: false,
        })
    }

    /// Append one region and its index entry
    ///
    /// Returns the number of bytes the region occupies in the data file.
    /// On error the data and index files may disagree; the caller owns the
    /// recovery decision.
    pub fn write<R: Region>(&mut self, region: &R) -> Result<u64> {
        let region_id = region.id();

        let mut counter = CountingWriter::new(&mut self.data);
        let reported = region.serialize(&mut counter)?;
        let region_size = counter.count;

        if reported != region_size {
            tracing::warn!(
                region_id,
                reported,
                written = region_size,
                "region serializer misreported its size, using bytes written"
            );
        }

        self.index_buf.clear();
        IndexEntry::new(region_id, region_size).encode_into(&mut self.index_buf);
        self.index.write_all(&self.index_buf)?;

        self.file.file_size += region_size;
        self.regions_written += 1;

        if self.sync_policy == SyncPolicy::EveryWrite {
            self.sync()?;
        }

        tracing::trace!(
            file_id = self.file.file_id(),
            region_id,
            region_size,
            "appended region"
        );

        Ok(region_size)
    }

    /// The file this session appends to
    pub fn file(&self) -> &RegionFile {
        &*self.file
    }

    /// Record `region_id` as owned by the file, see `RegionFile::add_region`
    ///
    /// Only liveness is reachable mid-session; `destroy`/`reset_id` need the
    /// writer gone first.
    pub fn add_region(&mut self, region_id: RegionId, region_size: u64) -> bool {
        self.file.add_region(region_id, region_size)
    }

    /// Forget `region_id`, see `RegionFile::drop_region`
    pub fn drop_region(&mut self, region_id: RegionId) -> bool {
        self.file.drop_region(region_id)
    }

    /// Number of regions appended by this session
    pub fn regions_written(&self) -> u64 {
        self.regions_written
    }

    /// Flush and fsync both files, surfacing any failure
    pub fn finish(mut self) -> Result<()> {
        self.closed = true;
        self.sync()?;

        tracing::debug!(
            file_id = self.file.file_id(),
            regions_written = self.regions_written,
            file_size = self.file.file_size(),
            "closed region file writer"
        );
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        // data before index: an index entry must never outlive its bytes
        self.data.flush()?;
        self.data.get_ref().sync_all()?;
        self.index.flush()?;
        self.index.get_ref().sync_all()?;
        Ok(())
    }
}

impl Drop for RegionFileWriter<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.sync() {
            tracing::error!(
                file_id = self.file.file_id(),
                error = %e,
                "failed to sync region file writer on drop"
            );
        }
    }
}

/// Counts the bytes a serializer actually hands to the data stream
struct CountingWriter<'w, W: Write> {
    inner: &'w mut W,
    count: u64,
}

impl<'w, W: Write> CountingWriter<'w, W> {
    fn new(inner: &'w mut W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

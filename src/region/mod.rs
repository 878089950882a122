//! Region Module
//!
//! The record contract consumed by region files.
//!
//! ## Responsibilities
//! - Identify a record by its numeric region ID
//! - Serialize a record into the data stream
//! - Rebuild a record from exactly the bytes the index says it occupies
//!
//! Region files never look inside a payload. Two record types ship with the
//! crate:
//! - [`RawRegion`]: payload bytes written verbatim
//! - [`RegionSnapshot`]: bincode body behind a CRC32 checksum

mod raw;
mod snapshot;

use std::io::{Read, Write};

use crate::error::Result;

pub use raw::RawRegion;
pub use snapshot::RegionSnapshot;

/// Numeric identity of a region
pub type RegionId = u64;

/// A serializable region record
pub trait Region: Sized {
    /// ID stored alongside the record in the index file
    fn id(&self) -> RegionId;

    /// Write the record and return the number of bytes written
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<u64>;

    /// Rebuild a record from its stored bytes
    ///
    /// `reader` yields exactly the record extent recorded in the index, and
    /// `id` is the region ID recorded next to it.
    fn deserialize<R: Read>(id: RegionId, reader: &mut R) -> Result<Self>;
}

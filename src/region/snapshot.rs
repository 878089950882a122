//! Checksummed region snapshots
//!
//! ## Record Format
//! ```text
//! ┌───────────┬──────────────────────────────────────┐
//! │ CRC32 (4) │ bincode { id, version, data }        │
//! └───────────┴──────────────────────────────────────┘
//! ```
//! The CRC covers the bincode body only.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{RegionError, Result};

use super::{Region, RegionId};

/// Size of the checksum prefix
const CHECKSUM_SIZE: usize = 4;

/// A versioned region state, serialized with bincode and guarded by CRC32
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSnapshot {
    /// Region identity (also recorded in the index)
    pub id: RegionId,

    /// Monotonic version of the region state
    pub version: u64,

    /// Opaque state bytes
    pub data: Vec<u8>,
}

impl RegionSnapshot {
    pub fn new(id: RegionId, version: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            version,
            data: data.into(),
        }
    }

    /// Encode to `[crc][body]`
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(self)?;
        let crc = crc32fast::hash(&body);

        let mut out = Vec::with_capacity(CHECKSUM_SIZE + body.len());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decode from `[crc][body]`, verifying the checksum
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < CHECKSUM_SIZE {
            return Err(RegionError::Serialization(format!(
                "snapshot record too short: {} bytes",
                bytes.len()
            )));
        }

        let (crc_bytes, body) = bytes.split_at(CHECKSUM_SIZE);
        let mut stored = [0u8; CHECKSUM_SIZE];
        stored.copy_from_slice(crc_bytes);
        let stored = u32::from_le_bytes(stored);
        let computed = crc32fast::hash(body);

        if stored != computed {
            return Err(RegionError::Serialization(format!(
                "snapshot checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            )));
        }

        Ok(bincode::deserialize(body)?)
    }
}

impl Region for RegionSnapshot {
    fn id(&self) -> RegionId {
        self.id
    }

    fn serialize<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let bytes = self.encode()?;
        writer.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    }

    fn deserialize<R: Read>(id: RegionId, reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let snapshot = Self::decode(&bytes)?;

        if snapshot.id != id {
            return Err(RegionError::Serialization(format!(
                "snapshot holds region {} but index names region {}",
                snapshot.id, id
            )));
        }
        Ok(snapshot)
    }
}

//! Raw region records
//!
//! The payload is the whole record: no header, no checksum.

use std::io::{Read, Write};

use bytes::Bytes;

use crate::error::Result;

use super::{Region, RegionId};

/// A region whose serialized form is its payload, byte for byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRegion {
    id: RegionId,
    payload: Bytes,
}

impl RawRegion {
    pub fn new(id: RegionId, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl Region for RawRegion {
    fn id(&self) -> RegionId {
        self.id
    }

    fn serialize<W: Write>(&self, writer: &mut W) -> Result<u64> {
        writer.write_all(&self.payload)?;
        Ok(self.payload.len() as u64)
    }

    fn deserialize<R: Read>(id: RegionId, reader: &mut R) -> Result<Self> {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        Ok(Self::new(id, payload))
    }
}

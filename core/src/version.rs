//! Manufacturing data returned by `GET_MANUFACTURING_DATA` in three chained frames.

use crate::cursor::{Cursor, OutOfBounds};
use crate::error::DecodeError;

/// Version of the hardware or the software part of the card
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PartVersion {
    pub vendor: u8,
    pub kind: u8,
    pub subtype: u8,
    pub major: u8,
    pub minor: u8,
    pub storage_size: u8,
    pub protocol: u8,
}

impl PartVersion {
    fn read(cursor: &mut Cursor) -> Result<Self, OutOfBounds> {
        Ok(Self {
            vendor: cursor.read_u8()?,
            kind: cursor.read_u8()?,
            subtype: cursor.read_u8()?,
            major: cursor.read_u8()?,
            minor: cursor.read_u8()?,
            storage_size: cursor.read_u8()?,
            protocol: cursor.read_u8()?,
        })
    }

    /// Approximate storage size in octets.
    /// The second value is `true` when the size lies between the value and its double.
    pub fn storage_bytes(&self) -> (u64, bool) {
        let size = 1u64
            .checked_shl((self.storage_size >> 1).into())
            .unwrap_or(u64::MAX);

        (size, self.storage_size & 0x01 != 0)
    }
}

/// Manufacturing data of the card
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VersionInfo {
    pub hardware: PartVersion,
    pub software: PartVersion,
    pub uid: [u8; 7],
    pub batch: [u8; 5],
    pub production_week: u8,
    pub production_year: u8,
}

/// Decodes the reassembled payload of all three frames.
pub fn decode(payload: &[u8]) -> Result<VersionInfo, DecodeError> {
    let mut cursor = Cursor::new(payload);
    let mut read = || -> Result<VersionInfo, OutOfBounds> {
        Ok(VersionInfo {
            hardware: PartVersion::read(&mut cursor)?,
            software: PartVersion::read(&mut cursor)?,
            uid: cursor.take_array()?,
            batch: cursor.take_array()?,
            production_week: cursor.read_u8()?,
            production_year: cursor.read_u8()?,
        })
    };

    read().map_err(|_| DecodeError::TruncatedPayload)
}

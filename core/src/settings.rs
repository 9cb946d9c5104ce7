//! File settings records, as returned by `GET_FILE_SETTINGS`.
//!
//! Every record starts with the same four octets:
//! `[type:1][comm:1][access:2]`. The rest depends on the file type.

use crate::cursor::{Cursor, OutOfBounds};
use crate::error::DecodeError;

/// Kind of the file, selecting the shape of its settings record
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FileType {
    StandardData = 0x00,
    BackupData = 0x01,
    Value = 0x02,
    LinearRecord = 0x03,
    CyclicRecord = 0x04,
}

impl TryFrom<u8> for FileType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Self::StandardData,
            0x01 => Self::BackupData,
            0x02 => Self::Value,
            0x03 => Self::LinearRecord,
            0x04 => Self::CyclicRecord,
            _ => return Err(DecodeError::UnknownFileType(value)),
        })
    }
}

/// How the data of the file travels between the card and the reader
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CommMode {
    Plain,
    Maced,
    Enciphered,
}

impl CommMode {
    pub fn from_settings(comm_settings: u8) -> Self {
        match comm_settings & 0x03 {
            0x01 => Self::Maced,
            0x03 => Self::Enciphered,
            _ => Self::Plain,
        }
    }
}

/// Key number required for an access, as encoded in a nibble of the access rights
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Access {
    Key(u8),
    Free,
    Denied,
}

impl From<u8> for Access {
    fn from(nibble: u8) -> Self {
        match nibble & 0x0F {
            0x0E => Self::Free,
            0x0F => Self::Denied,
            key => Self::Key(key),
        }
    }
}

/// The two access rights octets, least significant first on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AccessRights(pub [u8; 2]);

impl AccessRights {
    fn word(&self) -> u16 {
        u16::from_le_bytes(self.0)
    }

    pub fn read(&self) -> Access {
        Access::from((self.word() >> 12) as u8)
    }

    pub fn write(&self) -> Access {
        Access::from((self.word() >> 8) as u8)
    }

    pub fn read_write(&self) -> Access {
        Access::from((self.word() >> 4) as u8)
    }

    pub fn change(&self) -> Access {
        Access::from(self.word() as u8)
    }
}

/// Header common to the settings of every file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FileSettings {
    pub file_type: FileType,
    pub comm_settings: u8,
    pub access_rights: AccessRights,
}

impl FileSettings {
    fn read(cursor: &mut Cursor) -> Result<Self, DecodeError> {
        let file_type = FileType::try_from(cursor.read_u8().map_err(truncated)?)?;
        let comm_settings = cursor.read_u8().map_err(truncated)?;
        let access_rights = AccessRights(cursor.take_array().map_err(truncated)?);

        Ok(Self {
            file_type,
            comm_settings,
            access_rights,
        })
    }

    pub fn comm_mode(&self) -> CommMode {
        CommMode::from_settings(self.comm_settings)
    }
}

/// Settings of a standard or backup data file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DataFileSettings {
    pub common: FileSettings,
    pub file_size: u32,
}

/// Settings of a value file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ValueFileSettings {
    pub common: FileSettings,
    pub lower_limit: u32,
    pub upper_limit: u32,
    pub value: u32,
    pub limited_credit_enabled: u8,
}

impl ValueFileSettings {
    pub fn is_limited_credit_enabled(&self) -> bool {
        self.limited_credit_enabled & 0x01 != 0
    }
}

/// Settings of a linear or cyclic record file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RecordFileSettings {
    pub common: FileSettings,
    pub record_size: u32,
    pub max_records: u32,
    pub current_records: u32,
}

/// Settings of any file, dispatched on its type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AnyFileSettings {
    StandardData(DataFileSettings),
    BackupData(DataFileSettings),
    Value(ValueFileSettings),
    LinearRecord(RecordFileSettings),
    CyclicRecord(RecordFileSettings),
}

impl AnyFileSettings {
    pub fn common(&self) -> &FileSettings {
        match self {
            Self::StandardData(s) | Self::BackupData(s) => &s.common,
            Self::Value(s) => &s.common,
            Self::LinearRecord(s) | Self::CyclicRecord(s) => &s.common,
        }
    }
}

fn truncated(_: OutOfBounds) -> DecodeError {
    DecodeError::TruncatedPayload
}

fn read_data(common: FileSettings, cursor: &mut Cursor) -> Result<DataFileSettings, OutOfBounds> {
    Ok(DataFileSettings {
        common,
        file_size: cursor.read_u24_le()?,
    })
}

fn read_value(common: FileSettings, cursor: &mut Cursor) -> Result<ValueFileSettings, OutOfBounds> {
    Ok(ValueFileSettings {
        common,
        lower_limit: cursor.read_u32_le()?,
        upper_limit: cursor.read_u32_le()?,
        value: cursor.read_u32_le()?,
        limited_credit_enabled: cursor.read_u8()?,
    })
}

fn read_record(
    common: FileSettings,
    cursor: &mut Cursor,
) -> Result<RecordFileSettings, OutOfBounds> {
    Ok(RecordFileSettings {
        common,
        record_size: cursor.read_u24_le()?,
        max_records: cursor.read_u24_le()?,
        current_records: cursor.read_u24_le()?,
    })
}

/// Decodes the header common to every file.
pub fn decode(payload: &[u8]) -> Result<FileSettings, DecodeError> {
    FileSettings::read(&mut Cursor::new(payload))
}

/// Decodes the settings of a value file.
/// Fails with `UnexpectedFileType` if the payload describes another kind of file.
pub fn decode_value_file(payload: &[u8]) -> Result<ValueFileSettings, DecodeError> {
    let mut cursor = Cursor::new(payload);
    let common = FileSettings::read(&mut cursor)?;
    if common.file_type != FileType::Value {
        return Err(DecodeError::UnexpectedFileType(common.file_type));
    }

    read_value(common, &mut cursor).map_err(truncated)
}

/// Decodes the settings of any file.
pub fn decode_any(payload: &[u8]) -> Result<AnyFileSettings, DecodeError> {
    let mut cursor = Cursor::new(payload);
    let common = FileSettings::read(&mut cursor)?;
    let cursor = &mut cursor;

    let settings = match common.file_type {
        FileType::StandardData => read_data(common, cursor).map(AnyFileSettings::StandardData),
        FileType::BackupData => read_data(common, cursor).map(AnyFileSettings::BackupData),
        FileType::Value => read_value(common, cursor).map(AnyFileSettings::Value),
        FileType::LinearRecord => read_record(common, cursor).map(AnyFileSettings::LinearRecord),
        FileType::CyclicRecord => read_record(common, cursor).map(AnyFileSettings::CyclicRecord),
    };

    settings.map_err(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// type=value, plain, free read, lower=0, upper=1000000, value=42500, no limited credit.
    const VALUE_FILE: [u8; 17] = [
        0x02, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, //
        0x40, 0x42, 0x0F, 0x00, //
        0x04, 0xA6, 0x00, 0x00, //
        0x00,
    ];

    #[test]
    fn test_decode_value_file() {
        let settings = decode_value_file(&VALUE_FILE).unwrap();

        assert_eq!(FileType::Value, settings.common.file_type);
        assert_eq!(0, settings.lower_limit);
        assert_eq!(1_000_000, settings.upper_limit);
        assert_eq!(42500, settings.value);
        assert!(!settings.is_limited_credit_enabled());
    }

    #[test]
    fn test_trailing_octets_are_ignored() {
        let mut payload = VALUE_FILE.to_vec();
        payload.push(0xFF);

        assert_eq!(42500, decode_value_file(&payload).unwrap().value);
    }

    #[test]
    fn test_truncated_value_file() {
        for len in 0..VALUE_FILE.len() {
            assert_eq!(
                Err(DecodeError::TruncatedPayload),
                decode_value_file(&VALUE_FILE[..len]),
                "length {}",
                len,
            );
        }
    }

    #[test]
    fn test_unknown_file_type() {
        let mut payload = VALUE_FILE;
        payload[0] = 0x05;

        assert_eq!(
            Err(DecodeError::UnknownFileType(0x05)),
            decode_value_file(&payload)
        );
        assert_eq!(Err(DecodeError::UnknownFileType(0x05)), decode(&payload));
    }

    #[test]
    fn test_unexpected_file_type() {
        let payload = [0x00, 0x00, 0xEE, 0xEE, 0x20, 0x00, 0x00];

        assert_eq!(
            Err(DecodeError::UnexpectedFileType(FileType::StandardData)),
            decode_value_file(&payload)
        );
    }

    #[test]
    fn test_decode_header() {
        let header = decode(&[0x04, 0x03, 0x12, 0xE0]).unwrap();

        assert_eq!(FileType::CyclicRecord, header.file_type);
        assert_eq!(CommMode::Enciphered, header.comm_mode());
        assert_eq!(Access::Free, header.access_rights.read());
        assert_eq!(Access::Key(0), header.access_rights.write());
        assert_eq!(Access::Key(1), header.access_rights.read_write());
        assert_eq!(Access::Key(2), header.access_rights.change());
        assert_eq!(Err(DecodeError::TruncatedPayload), decode(&[0x04, 0x03, 0x12]));
    }

    #[test]
    fn test_decode_any() {
        assert_eq!(
            Ok(AnyFileSettings::BackupData(DataFileSettings {
                common: FileSettings {
                    file_type: FileType::BackupData,
                    comm_settings: 0x01,
                    access_rights: AccessRights([0xEE, 0xEE]),
                },
                file_size: 0x000120,
            })),
            decode_any(&[0x01, 0x01, 0xEE, 0xEE, 0x20, 0x01, 0x00]),
        );

        let record = decode_any(&[
            0x03, 0x00, 0x00, 0xF0, 0x10, 0x00, 0x00, 0x05, 0x00, 0x00, 0x02, 0x00, 0x00,
        ])
        .unwrap();
        match record {
            AnyFileSettings::LinearRecord(r) => {
                assert_eq!(16, r.record_size);
                assert_eq!(5, r.max_records);
                assert_eq!(2, r.current_records);
                assert_eq!(Access::Denied, r.common.access_rights.read());
            }
            _ => panic!("expected a linear record file, got {:?}", record),
        }

        assert!(matches!(
            decode_any(&VALUE_FILE),
            Ok(AnyFileSettings::Value(ValueFileSettings { value: 42500, .. }))
        ));
        assert_eq!(
            Err(DecodeError::TruncatedPayload),
            decode_any(&[0x03, 0x00, 0x00, 0xF0, 0x10, 0x00, 0x00])
        );
    }

    #[test]
    fn test_comm_mode() {
        assert_eq!(CommMode::Plain, CommMode::from_settings(0x00));
        assert_eq!(CommMode::Maced, CommMode::from_settings(0x01));
        assert_eq!(CommMode::Plain, CommMode::from_settings(0x02));
        assert_eq!(CommMode::Enciphered, CommMode::from_settings(0x03));
        assert_eq!(CommMode::Maced, CommMode::from_settings(0xF1));
    }

    #[test]
    fn test_common_header() {
        let value = decode_any(&VALUE_FILE).unwrap();
        assert_eq!(FileType::Value, value.common().file_type);
        assert_eq!(CommMode::Plain, value.common().comm_mode());

        let cyclic = decode_any(&[
            0x04, 0x01, 0x12, 0xE0, 0x10, 0x00, 0x00, 0x05, 0x00, 0x00, 0x02, 0x00, 0x00,
        ])
        .unwrap();
        assert_eq!(FileType::CyclicRecord, cyclic.common().file_type);
        assert_eq!(CommMode::Maced, cyclic.common().comm_mode());
        assert_eq!(AccessRights([0x12, 0xE0]), cyclic.common().access_rights);
    }
}

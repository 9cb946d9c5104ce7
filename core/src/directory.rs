//! Application and file directories.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::DecodeError;

/// A 3-octet application identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ApplicationId(u32);

impl ApplicationId {
    /// Length of the identifier on the wire.
    pub const LENGTH: usize = 3;

    /// Creates an identifier, ignoring the most significant octet.
    pub const fn new(id: u32) -> Self {
        Self(id & 0x00FF_FFFF)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Octets sent as the parameter of `SELECT_APPLICATION`, most significant first.
    pub fn to_bytes(self) -> [u8; 3] {
        let [_, b0, b1, b2] = self.0.to_be_bytes();
        [b0, b1, b2]
    }

    pub fn from_bytes([b0, b1, b2]: [u8; 3]) -> Self {
        Self(u32::from_be_bytes([0, b0, b1, b2]))
    }
}

impl Display for ApplicationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

impl FromStr for ApplicationId {
    type Err = std::num::ParseIntError;

    /// Parses an identifier from hex digits, with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        u32::from_str_radix(digits, 16).map(Self::new)
    }
}

/// Decodes the payload of `GET_APPLICATION_DIRECTORY`.
pub fn decode_application_ids(payload: &[u8]) -> Result<Vec<ApplicationId>, DecodeError> {
    if payload.len() % ApplicationId::LENGTH != 0 {
        return Err(DecodeError::UnexpectedLength {
            expected: (payload.len() / ApplicationId::LENGTH + 1) * ApplicationId::LENGTH,
            actual: payload.len(),
        });
    }

    Ok(payload
        .chunks_exact(ApplicationId::LENGTH)
        .map(|c| ApplicationId::from_bytes([c[0], c[1], c[2]]))
        .collect())
}

/// Decodes the payload of `GET_FILES`: one file number per octet.
pub fn decode_file_ids(payload: &[u8]) -> Vec<u8> {
    payload.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_id() {
        let aid = ApplicationId::new(0x5F8415);

        assert_eq!([0x5F, 0x84, 0x15], aid.to_bytes());
        assert_eq!(aid, ApplicationId::from_bytes(aid.to_bytes()));
        assert_eq!("5F8415", aid.to_string());
        assert_eq!(Ok(aid), "0x5f8415".parse::<ApplicationId>());
        assert_eq!(Ok(aid), "5F8415".parse::<ApplicationId>());
        assert!("mensa".parse::<ApplicationId>().is_err());
    }

    #[test]
    fn test_decode_application_ids() {
        assert_eq!(
            Ok(vec![ApplicationId::new(0x5F8415), ApplicationId::new(0x000001)]),
            decode_application_ids(&[0x5F, 0x84, 0x15, 0x00, 0x00, 0x01]),
        );
        assert_eq!(Ok(vec![]), decode_application_ids(&[]));
        assert_eq!(
            Err(DecodeError::UnexpectedLength {
                expected: 6,
                actual: 4,
            }),
            decode_application_ids(&[0x5F, 0x84, 0x15, 0x00]),
        );
        assert_eq!(
            Err(DecodeError::UnexpectedLength {
                expected: 3,
                actual: 1,
            }),
            decode_application_ids(&[0x5F]),
        );
    }
}

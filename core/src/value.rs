//! Decoding `READ_VALUE` responses and presenting them as currency amounts.

use std::fmt::{Display, Formatter};

use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::settings::ValueFileSettings;

/// Length of the value returned by `READ_VALUE`.
pub const VALUE_LENGTH: usize = 4;

/// Number of stored units per currency unit.
pub const SCALE: i64 = 1000;

/// Decodes the signed little-endian value of a `READ_VALUE` payload, without the status octet.
pub fn decode(payload: &[u8]) -> Result<i32, DecodeError> {
    if payload.len() != VALUE_LENGTH {
        return Err(DecodeError::UnexpectedLength {
            expected: VALUE_LENGTH,
            actual: payload.len(),
        });
    }

    Ok(Cursor::new(payload).read_i32_le()?)
}

/// A fixed-point currency amount, stored in thousandths.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Amount(i64);

impl Amount {
    pub fn from_milli(milli: i64) -> Self {
        Self(milli)
    }

    pub fn milli(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / SCALE as f64
    }
}

impl Display for Amount {
    /// Renders at least two decimal places, keeping the third only when it is significant.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let (units, milli) = (abs / SCALE as u64, abs % SCALE as u64);

        match milli % 10 {
            0 => write!(f, "{}{}.{:02}", sign, units, milli / 10),
            _ => write!(f, "{}{}.{:03}", sign, units, milli),
        }
    }
}

/// Balance read from the card in a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Balance {
    /// Value returned by `READ_VALUE`.
    pub value: Amount,

    /// Value field of the file settings record.
    /// Shown as the last transaction by the card operator's own app,
    /// though the card documents it as a plain value.
    pub last_transaction: Amount,
}

impl Balance {
    pub fn new(value: i32, settings: &ValueFileSettings) -> Self {
        Self {
            value: Amount::from_milli(value.into()),
            last_transaction: Amount::from_milli(settings.value.into()),
        }
    }
}

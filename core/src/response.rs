//! Classifying raw responses by their trailing status octet.

use crate::error::DecodeError;

/// Status octets returned by the card.
pub mod status {
    pub const OPERATION_OK: u8 = 0x00;
    pub const PERMISSION_DENIED: u8 = 0x9D;
    pub const ADDITIONAL_FRAME: u8 = 0xAF;
}

/// A response that was received from the card, split at the status octet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The card finished the operation.
    Complete(Vec<u8>),

    /// More data follows and must be fetched with an additional-frame command.
    Continuation(Vec<u8>),

    /// The card rejected the operation with the status.
    Failure(u8),
}

impl Outcome {
    /// Parses a response from the octets.
    pub fn classify(mut raw: Vec<u8>) -> Result<Self, DecodeError> {
        let status = raw.pop().ok_or(DecodeError::EmptyResponse)?;

        Ok(match status {
            status::OPERATION_OK => Self::Complete(raw),
            status::ADDITIONAL_FRAME => Self::Continuation(raw),
            _ => Self::Failure(status),
        })
    }
}

//! Error taxonomy shared by the codec, the card adapter and the session.

use crate::command::Instruction;
use crate::cursor::OutOfBounds;
use crate::nfc::TransportError;
use crate::settings::FileType;

/// A received payload that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("{0}")]
    OutOfBounds(#[from] OutOfBounds),

    #[error("The payload ended before the record was complete")]
    TruncatedPayload,

    #[error("Unknown file type: {0:#04X}")]
    UnknownFileType(u8),

    #[error("Expected a value file, but the card reported {0:?}")]
    UnexpectedFileType(FileType),

    #[error("Expected {expected} octets, got {actual}")]
    UnexpectedLength { expected: usize, actual: usize },

    #[error("The response carried no status octet")]
    EmptyResponse,

    #[error("Unknown instruction: {0:#04X}")]
    UnknownInstruction(u8),

    #[error("The command frame is malformed")]
    MalformedFrame,
}

/// Errors raised while talking to the card.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error occurred while communicating with the card: {0}")]
    Transport(#[source] TransportError),

    #[error("The card rejected {instruction:?} with status {status:#04X}")]
    Protocol { instruction: Instruction, status: u8 },

    #[error("Failed to decode the response: {0}")]
    Decode(#[from] DecodeError),

    #[error("Parameters of {len} octets do not fit in a single length octet")]
    InvalidParameters { len: usize },

    #[error("The card kept requesting additional frames beyond {limit}")]
    TooManyFrames { limit: usize },

    #[error("The exchange was cancelled")]
    Cancelled,
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Cancelled => Error::Cancelled,
            e => Error::Transport(e),
        }
    }
}

impl From<OutOfBounds> for Error {
    fn from(e: OutOfBounds) -> Self {
        Error::Decode(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

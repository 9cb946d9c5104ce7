//! Communicating with the card using NFC technology

use std::error::Error as StdError;

/// Failure of the link to the card, reported by the delegate.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Link(Box<dyn StdError + Send + Sync>),

    #[error("The exchange was cancelled by the session owner")]
    Cancelled,
}

impl TransportError {
    /// Wraps any error or message as a link failure.
    pub fn link<E>(e: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        TransportError::Link(e.into())
    }
}

/// A delegate to communicate with the card outside.
pub trait Transport<Ctx> {
    /// Transmits the framed command to the card, then receives the raw response.
    /// The last octet of the response is the status.
    fn send(&self, ctx: Ctx, command: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// Tells the owner of the tag session that the exchange is over.
    /// `reason` is `None` when the exchange completed successfully.
    fn invalidate(&self, ctx: Ctx, reason: Option<&str>);
}

//! PC/SC support for desfire library.
//! Can be enabled by turning `pcsc` feature on.
//!
//! ## Wrapped responses
//! Through PC/SC the card answers a wrapped native command with ISO 7816-4 status words
//! `91 XX`, where `XX` is the native status. The transport strips the `91` octet,
//! so the response keeps the native layout: payload followed by a single status octet.
//!
//! ## Usage
//! ```rust,no_run
//! use desfire::pcsc::Context;
//! use desfire::{Session, SessionConfig};
//!
//! let ctx = Context::try_new().unwrap();
//! let device = ctx.open().unwrap();
//! let pcsc_card = device.connect(ctx).unwrap();
//!
//! let balance = Session::new(Box::new(pcsc_card), SessionConfig::default())
//!     .run(())
//!     .unwrap();
//! ```

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::thread::sleep;
use std::time::Duration;

use pcsc::{Card, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE};

use crate::nfc::{Transport, TransportError};

/// SW1 of every response to a wrapped native command.
const SW1_NATIVE: u8 = 0x91;

/// Failure to reach a DESFire card through the PC/SC service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error occurred while communicating with PC/SC: {0}")]
    PcscError(#[from] pcsc::Error),

    #[error("Reader not found on PC/SC service")]
    ReaderNotFound,
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// PC/SC context used to find the reader that holds the card.
pub struct Context<'a> {
    ctx: pcsc::Context,
    _lifetime: PhantomData<&'a ()>,
}

impl<'a> Context<'a> {
    /// Creates a PC/SC context in user scope.
    pub fn try_new() -> Result<Self> {
        Ok(Self {
            ctx: pcsc::Context::establish(Scope::User).map_err(Error::PcscError)?,
            _lifetime: Default::default(),
        })
    }

    /// Picks the first reader listed by the service.
    pub fn open<'b>(&self) -> Result<Device<'b>> {
        let mut buf = [0u8; 2048];

        Ok(Device::new(
            self.ctx
                .list_readers(&mut buf)
                .map_err(Error::PcscError)?
                .next()
                .ok_or(Error::ReaderNotFound)?,
        ))
    }
}

/// Reader the DESFire card is placed on.
pub struct Device<'a> {
    reader: Box<CString>,
    _lifetime: PhantomData<&'a ()>,
}

impl<'a> Device<'a> {
    fn new(reader: &CStr) -> Self {
        debug!("Using device: {}", reader.to_str().unwrap_or_default());

        Self {
            reader: Box::new(reader.to_owned()),
            _lifetime: Default::default(),
        }
    }

    /// Polls the reader each second until a card is present, then connects to it.
    pub fn connect(&self, ctx: Context) -> Result<PcscCard<'a>> {
        debug!("Waiting for a card");

        loop {
            match ctx
                .ctx
                .connect(&self.reader, ShareMode::Shared, Protocols::ANY)
            {
                Ok(card) => {
                    debug!("Connected to your card");

                    return Ok(PcscCard::new(card));
                }
                Err(e) => match e {
                    pcsc::Error::NoSmartcard => {
                        info!("Still waiting for your card...");
                        sleep(Duration::from_secs(1));

                        continue;
                    }
                    _ => return Err(Error::PcscError(e)),
                },
            }
        }
    }
}

/// A DESFire card reached through PC/SC, taking wrapped native commands.
pub struct PcscCard<'a> {
    card: Card,
    _lifetime: PhantomData<&'a ()>,
}

impl<'a> PcscCard<'a> {
    fn new(card: Card) -> Self {
        Self {
            card,
            _lifetime: Default::default(),
        }
    }

    /// Transmits a wrapped command and returns the raw response, status words included.
    pub fn transmit(&self, tx: &[u8]) -> Result<Vec<u8>> {
        let mut rx = [0u8; MAX_BUFFER_SIZE];
        let rx = self.card.transmit(tx, &mut rx).map_err(Error::PcscError)?;

        Ok(Vec::from(rx))
    }
}

/// Drops the `91` status word of a wrapped response, keeping the native status octet last.
fn unwrap_status(mut rx: Vec<u8>) -> std::result::Result<Vec<u8>, TransportError> {
    match rx.len().checked_sub(2).map(|i| (i, rx[i])) {
        Some((i, SW1_NATIVE)) => {
            rx.remove(i);
            Ok(rx)
        }
        _ => Err(TransportError::link(format!(
            "Unexpected response to a wrapped command: {}",
            hex::encode(&rx)
        ))),
    }
}

type Ctx = ();

impl<'a> Transport<Ctx> for PcscCard<'a> {
    fn send(&self, _: Ctx, command: &[u8]) -> std::result::Result<Vec<u8>, TransportError> {
        self.transmit(command)
            .map_err(TransportError::link)
            .and_then(unwrap_status)
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn invalidate(&self, _: Ctx, reason: Option<&str>) {
        info!(
            "Session finished: {}",
            reason.unwrap_or("the value was read")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_status() {
        assert_eq!(
            vec![0x64, 0x00, 0x00, 0x00, 0x00],
            unwrap_status(vec![0x64, 0x00, 0x00, 0x00, 0x91, 0x00]).unwrap()
        );
        assert_eq!(vec![0xAF], unwrap_status(vec![0x91, 0xAF]).unwrap());
        assert!(unwrap_status(vec![0x6A, 0x82]).is_err());
        assert!(unwrap_status(vec![0x00]).is_err());
    }
}

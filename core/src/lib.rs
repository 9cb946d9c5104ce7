//! A crate to read the value file of a DESFire card through a wrapped-APDU delegate.

// Logging macros must be in textual scope before the modules below.
#[cfg(feature = "tracing")]
#[macro_use]
extern crate tracing;

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! info {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn {
    ($($t: tt)*) => {};
}

#[cfg(feature = "pcsc")]
pub mod pcsc;

pub mod card;
pub mod command;
pub mod cursor;
pub mod directory;
pub mod error;
pub mod nfc;
pub mod response;
pub mod session;
pub mod settings;
pub mod value;
pub mod version;

#[cfg(test)]
mod mock;

pub use card::Card;
pub use error::{DecodeError, Error, Result};
pub use session::{Session, SessionConfig, SessionError};
pub use value::{Amount, Balance};

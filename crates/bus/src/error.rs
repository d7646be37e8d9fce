//! Error types for the bus layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The broker could not be reached or refused the operation. Surfaced
    /// to the caller as an explicit failure, never a silent empty result.
    #[error("bus unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    /// Wrap any broker-side failure, keeping its message.
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Error::Unavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error types for szc
//!
//! The decode path has no error type: malformed input only means that no
//! value has completed yet.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller handed the encoder text that is not one complete value
    #[error("invalid value for field `{key}`: {reason}")]
    InvalidField { key: String, reason: String },

    #[error("relay error: {0}")]
    Relay(String),
}

pub type Result<T> = std::result::Result<T, Error>;

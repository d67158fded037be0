//! szc - Framed S-expression relay front-end
//!
//! Arsitektur:
//! - protocol: streaming decoder, writer, framing SOH/NUL
//! - network: buffered connection + readiness loop ke relay
//!
//! The relay (the messaging library side) is an external collaborator behind
//! the [`network::Relay`] trait.

pub mod config;
pub mod error;
pub mod network;
pub mod protocol;

pub use config::SessionConfig;
pub use error::{Error, Result};

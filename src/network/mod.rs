//! Network Layer: Front-end I/O
//!
//! Menggunakan mio untuk menunggu stdin readable.
//!
//! Fitur:
//! - Non-blocking stdin dengan epoll/kqueue
//! - Buffered output, satu flush per batch pesan
//! - Relay (messaging library) sebagai collaborator eksternal

mod connection;
mod relay;
mod session;

pub use connection::Connection;
pub use relay::{Command, Outbox, Relay, TraceRelay};
pub use session::{start_banner, Pump, Session};

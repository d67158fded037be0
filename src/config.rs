//! Session configuration

use crate::protocol::Framing;

/// Buffer sizes - tuned untuk typical message sizes
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024; // 64KB
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 64 * 1024; // 64KB

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How inbound SOH/NUL bytes are treated
    pub framing: Framing,
    pub read_buffer_size: usize,
    pub write_buffer_size: usize,
    /// Emit the `tzcspew start` banner before reading input
    pub banner: bool,
    /// Identity reported in the banner when the relay has none
    pub identity: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            framing: Framing::Sentinels,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            banner: true,
            identity: None,
        }
    }
}

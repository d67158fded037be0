//! Message framing
//!
//! Layout satu pesan keluar:
//! ┌──────┬──────────────────────────────────────────┬──────┐
//! │ SOH  │ ((key . value) (key . value) ...)        │ NUL  │
//! └──────┴──────────────────────────────────────────┴──────┘
//!
//! Sentinel hanya ditulis di sisi encode. Di sisi decode, perlakuannya
//! dipilih lewat [`Framing`].

use crate::error::{Error, Result};

use super::reader::Decoder;
use super::value::Value;

/// Start-of-message sentinel (SOH)
pub const FRAME_START: u8 = 0x01;
/// End-of-message sentinel (NUL)
pub const FRAME_END: u8 = 0x00;

/// How a decoder treats the framing sentinels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// Sentinels are ordinary bytes and go through the grammar untouched
    #[default]
    Grammar,
    /// Outside strings and escapes, SOH and NUL act as whitespace
    Sentinels,
}

impl Framing {
    #[inline(always)]
    pub(crate) fn is_sentinel(self, byte: u8) -> bool {
        self == Framing::Sentinels && (byte == FRAME_START || byte == FRAME_END)
    }
}

/// One outbound message: ordered `(key . value)` fields
///
/// Urutan field ditentukan caller, tidak di-sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    fields: Vec<(String, String)>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field whose value is rendered from `value`
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into().render()));
        self
    }

    /// Append a field from already-rendered text, such as a [`pair`]
    ///
    /// The text must read back as exactly one complete value.
    ///
    /// [`pair`]: super::writer::pair
    pub fn raw_field(mut self, key: impl Into<String>, rendered: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let rendered = rendered.into();
        check_rendered(&key, &rendered)?;
        self.fields.push((key, rendered));
        Ok(self)
    }

    /// Fields in insertion order as `(key, rendered value)`
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn check_rendered(key: &str, rendered: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidField {
        key: key.to_owned(),
        reason: reason.to_owned(),
    };

    if rendered.bytes().any(|b| b == FRAME_START || b == FRAME_END) {
        return Err(invalid("contains a framing sentinel"));
    }

    // Trailing space closes a bare atom; anything still open stays pending.
    let mut decoder = Decoder::new();
    let count = decoder.decode(rendered.as_bytes()).count() + decoder.decode(b" ").count();

    if !decoder.is_idle() {
        return Err(invalid("unterminated value"));
    }
    // A stray ')' would close the enclosing message early
    if decoder.dropped_closes() > 0 {
        return Err(invalid("unmatched close marker"));
    }
    match count {
        0 => Err(invalid("no value")),
        1 => Ok(()),
        _ => Err(invalid("more than one value")),
    }
}

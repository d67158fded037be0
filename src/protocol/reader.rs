//! Streaming S-expression Reader
//!
//! Finite state machine per-byte + stack list yang sedang dibangun.
//! State disimpan antar panggilan, jadi satu pesan boleh datang dalam
//! beberapa potongan dengan batas sembarang.
//!
//! Prinsip desain:
//! - Tidak pernah error: input rusak hanya berarti "belum ada value"
//! - Transisi ditentukan oleh kelas byte, bukan byte literal
//! - Satu byte menghasilkan paling banyak satu value top-level

use std::mem;

use tracing::trace;

use super::message::Framing;
use super::value::Value;

/// Lexical mode of the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Start,
    Symbol,
    SymbolEscaped,
    String,
    StringEscaped,
    Dot,
    Integer,
    Float,
}

/// Byte classes that drive the transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Whitespace,
    Open,
    Close,
    Quote,
    Backslash,
    Digit,
    Dot,
    Other,
}

#[inline(always)]
fn classify(byte: u8, framing: Framing) -> Class {
    match byte {
        b'\t' | b'\n' | b' ' => Class::Whitespace,
        b'(' => Class::Open,
        b')' => Class::Close,
        b'"' => Class::Quote,
        b'\\' => Class::Backslash,
        b'0'..=b'9' => Class::Digit,
        b'.' => Class::Dot,
        _ if framing.is_sentinel(byte) => Class::Whitespace,
        _ => Class::Other,
    }
}

/// What the token buffer becomes when it is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Atom {
    Symbol,
    String,
    Integer,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Append,
    Clear,
    Close(Atom),
    Push,
    Pop,
}

type Transition = (&'static [Action], State);

use Action::{Append, Clear, Close, Pop, Push};

/// Shared tail of the Symbol, Integer and Float rows: the atom kind decides
/// what whitespace and list markers close the token into.
#[inline(always)]
fn close_on_boundary(atom: Atom, class: Class) -> Option<Transition> {
    let actions: &'static [Action] = match (atom, class) {
        (Atom::Symbol, Class::Whitespace) => &[Close(Atom::Symbol)],
        (Atom::Symbol, Class::Open) => &[Close(Atom::Symbol), Push],
        (Atom::Symbol, Class::Close) => &[Close(Atom::Symbol), Pop],
        (Atom::Integer, Class::Whitespace) => &[Close(Atom::Integer)],
        (Atom::Integer, Class::Open) => &[Close(Atom::Integer), Push],
        (Atom::Integer, Class::Close) => &[Close(Atom::Integer), Pop],
        (Atom::Float, Class::Whitespace) => &[Close(Atom::Float)],
        (Atom::Float, Class::Open) => &[Close(Atom::Float), Push],
        (Atom::Float, Class::Close) => &[Close(Atom::Float), Pop],
        _ => return None,
    };
    Some((actions, State::Start))
}

/// (state, class) -> (actions, next state)
fn transition(state: State, class: Class) -> Transition {
    match state {
        State::Start => match class {
            Class::Whitespace => (&[], State::Start),
            Class::Open => (&[Push], State::Start),
            Class::Close => (&[Pop], State::Start),
            Class::Quote => (&[], State::String),
            Class::Backslash => (&[], State::SymbolEscaped),
            Class::Digit => (&[Append], State::Integer),
            Class::Dot => (&[Append], State::Dot),
            Class::Other => (&[Append], State::Symbol),
        },
        State::Symbol => close_on_boundary(Atom::Symbol, class).unwrap_or(match class {
            Class::Quote => (&[Close(Atom::Symbol)], State::String),
            Class::Backslash => (&[], State::SymbolEscaped),
            _ => (&[Append], State::Symbol),
        }),
        State::SymbolEscaped => (&[Append], State::Symbol),
        State::String => match class {
            Class::Backslash => (&[], State::StringEscaped),
            Class::Quote => (&[Close(Atom::String)], State::Start),
            _ => (&[Append], State::String),
        },
        State::StringEscaped => (&[Append], State::String),
        State::Integer => close_on_boundary(Atom::Integer, class).unwrap_or(match class {
            Class::Digit => (&[Append], State::Integer),
            Class::Dot => (&[Append], State::Float),
            Class::Backslash => (&[], State::SymbolEscaped),
            _ => (&[Append], State::Symbol),
        }),
        State::Float => close_on_boundary(Atom::Float, class).unwrap_or(match class {
            Class::Digit => (&[Append], State::Float),
            Class::Backslash => (&[], State::SymbolEscaped),
            _ => (&[Append], State::Symbol),
        }),
        // A dot on its own is not a value
        State::Dot => match class {
            Class::Digit => (&[Append], State::Float),
            Class::Whitespace => (&[Clear], State::Start),
            Class::Open => (&[Clear, Push], State::Start),
            Class::Close => (&[Clear, Pop], State::Start),
            _ => (&[Append], State::Symbol),
        },
    }
}

/// Resumable S-expression decoder
///
/// Satu instance per session. Tidak ada sharing, tidak ada locking.
#[derive(Debug, Default)]
pub struct Decoder {
    state: State,
    framing: Framing,
    token: Vec<u8>,
    stack: Vec<Vec<Value>>,
    dropped_closes: usize,
}

impl Decoder {
    /// Decoder over the bare grammar; SOH and NUL are ordinary bytes
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_framing(framing: Framing) -> Self {
        Self {
            framing,
            ..Self::default()
        }
    }

    /// Lazily decode `input`, yielding each top-level value as it completes
    ///
    /// Bytes are fed only as the iterator is pulled; dropping it early leaves
    /// the rest of `input` unread. Use [`Decoder::feed`] to consume a whole
    /// chunk at once.
    pub fn decode<'a>(&'a mut self, input: &'a [u8]) -> Values<'a> {
        Values {
            decoder: self,
            input: input.iter(),
        }
    }

    /// Feed a whole chunk and collect every completed top-level value
    pub fn feed(&mut self, input: &[u8]) -> Vec<Value> {
        self.decode(input).collect()
    }

    /// Advance the machine by one byte
    #[inline]
    pub fn feed_byte(&mut self, byte: u8) -> Option<Value> {
        let (actions, next) = transition(self.state, classify(byte, self.framing));
        self.state = next;

        let mut emitted = None;
        for action in actions {
            let completed = match *action {
                Append => {
                    self.token.push(byte);
                    None
                }
                Clear => {
                    trace!("discarding stray dot");
                    self.token.clear();
                    None
                }
                Close(atom) => {
                    let value = self.take_token(atom);
                    self.complete(value)
                }
                Push => {
                    self.stack.push(Vec::new());
                    None
                }
                Pop => match self.stack.pop() {
                    Some(items) => self.complete(Value::List(items)),
                    None => {
                        trace!("dropping unmatched close marker");
                        self.dropped_closes += 1;
                        None
                    }
                },
            };
            if completed.is_some() {
                debug_assert!(emitted.is_none());
                emitted = completed;
            }
        }
        emitted
    }

    /// Hand a finished value to the open list, or to the caller if none is open
    #[inline(always)]
    fn complete(&mut self, value: Value) -> Option<Value> {
        match self.stack.last_mut() {
            Some(frame) => {
                frame.push(value);
                None
            }
            None => Some(value),
        }
    }

    fn take_token(&mut self, atom: Atom) -> Value {
        let text = match String::from_utf8(mem::take(&mut self.token)) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };

        match atom {
            Atom::Symbol if text == "nil" => Value::nil(),
            Atom::Symbol => Value::Symbol(text),
            Atom::String => Value::String(text),
            // Out-of-range numerals keep their digits as a symbol
            Atom::Integer => text
                .parse()
                .map(Value::Integer)
                .unwrap_or(Value::Symbol(text)),
            Atom::Float => text.parse().map(Value::Float).unwrap_or(Value::Symbol(text)),
        }
    }

    /// Current lexical mode
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline(always)]
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Number of lists opened and not yet closed
    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Close markers ignored so far because no list was open
    #[inline(always)]
    pub fn dropped_closes(&self) -> usize {
        self.dropped_closes
    }

    /// True when nothing is pending: no open list, no partial token
    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        self.state == State::Start && self.stack.is_empty() && self.token.is_empty()
    }
}

/// Iterator over top-level values completed by one input chunk
pub struct Values<'a> {
    decoder: &'a mut Decoder,
    input: std::slice::Iter<'a, u8>,
}

impl Values<'_> {
    /// Bytes of the chunk not fed yet
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.input.len()
    }
}

impl Iterator for Values<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        for &byte in self.input.by_ref() {
            if let Some(value) = self.decoder.feed_byte(byte) {
                return Some(value);
            }
        }
        None
    }
}

//! S-expression value model
//!
//! Satu tipe untuk semua yang bisa lewat di wire: atom (symbol, string,
//! integer, float) dan list. List selalu dalam urutan source.

use std::fmt;

use super::writer;

/// Universal S-expression value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Bare identifier. Empty text is `nil`.
    Symbol(String),
    /// Quoted text
    String(String),
    Integer(i64),
    Float(f64),
    /// Closed list, in source order
    List(Vec<Value>),
}

impl Value {
    /// The empty symbol, rendered as `nil`
    #[inline]
    pub fn nil() -> Self {
        Value::Symbol(String::new())
    }

    #[inline]
    pub fn symbol(s: impl Into<String>) -> Self {
        Value::Symbol(s.into())
    }

    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    #[inline]
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Symbol(s) if s.is_empty())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Two-part dispatch tag: the first element of a list, when that element
    /// is itself a list of exactly two symbols.
    ///
    /// `((tzcfodder subscribe) ...)` -> `Some(("tzcfodder", "subscribe"))`
    pub fn tag(&self) -> Option<(&str, &str)> {
        match self.as_list()?.first()?.as_list()? {
            [Value::Symbol(a), Value::Symbol(b)] => Some((a.as_str(), b.as_str())),
            _ => None,
        }
    }

    /// Canonical textual form, without framing
    pub fn render(&self) -> String {
        match self {
            Value::Symbol(s) => writer::symbol(s),
            Value::String(s) => writer::quoted(s),
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => writer::float(*f),
            Value::List(items) => writer::list(items.iter().map(Value::render)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

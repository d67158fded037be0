//! S-expression Writer
//!
//! Fungsi render murni (stateless, reentrant) plus `Encoder` dengan
//! buffer reusable untuk framing pesan keluar.
//!
//! Format frame:
//! `[SOH] ((key . value) (key . value) ...) [NUL]`

use super::message::{Message, FRAME_END, FRAME_START};

/// Characters a bare symbol may carry without a backslash
const SYMBOL_CHARS: &[u8] =
    b"!$%&*+-/0123456789:<=>@ABCDEFGHIJKLMNOPQRSTUVWXYZ^_abcdefghijklmnopqrstuvwxyz{}~";

#[inline(always)]
fn is_symbol_char(c: char) -> bool {
    c.is_ascii() && SYMBOL_CHARS.contains(&(c as u8))
}

/// Render a bare symbol
///
/// Empty input is `nil`. A leading sign or digit gets a backslash in front of
/// the whole token so a peer reader does not take it for a number.
pub fn symbol(s: &str) -> String {
    if s.is_empty() {
        return "nil".to_owned();
    }

    let mut out = String::with_capacity(s.len() + 1);
    if s.starts_with(|c: char| c == '+' || c == '-' || c.is_ascii_digit()) {
        out.push('\\');
    }
    for c in s.chars() {
        if !is_symbol_char(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render a double-quoted string
///
/// Only SOH, `"` and `'` are escaped; everything else is copied as is.
pub fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\u{1}' => out.push_str("\\1"),
            '"' | '\'' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Join already-rendered items into a list
pub fn list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::from("(");
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(item.as_ref());
    }
    out.push(')');
    out
}

/// Dotted pair from two already-rendered halves
#[inline]
pub fn pair(a: &str, b: &str) -> String {
    format!("({a} . {b})")
}

/// Render a float so that a reader sees it as one
///
/// `Display` for f64 never uses an exponent, it only drops the fraction for
/// whole numbers.
pub fn float(f: f64) -> String {
    let mut s = f.to_string();
    if f.is_finite() && !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// Reusable output buffer for framed messages
///
/// Pesan di-append berurutan sampai `reset()`, jadi beberapa pesan bisa
/// di-flush dengan satu write.
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    /// Membuat encoder dengan kapasitas awal tertentu
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Reset encoder untuk reuse
    #[inline(always)]
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Append one framed message and return its bytes
    pub fn encode(&mut self, message: &Message) -> &[u8] {
        let start = self.buffer.len();

        self.buffer.push(FRAME_START);
        self.buffer.push(b'(');
        for (i, (key, value)) in message.fields().enumerate() {
            if i > 0 {
                self.buffer.push(b' ');
            }
            self.buffer
                .extend_from_slice(pair(&symbol(key), value).as_bytes());
        }
        self.buffer.push(b')');
        self.buffer.push(FRAME_END);

        &self.buffer[start..]
    }

    /// Get current buffer content
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(4096)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Value;

    #[test]
    fn test_symbol_nil() {
        assert_eq!(symbol(""), "nil");
    }

    #[test]
    fn test_symbol_leading_sign_or_digit() {
        assert_eq!(symbol("+5"), "\\+5");
        assert_eq!(symbol("-x"), "\\-x");
        assert_eq!(symbol("9lives"), "\\9lives");
        assert_eq!(symbol("x-9"), "x-9");
    }

    #[test]
    fn test_symbol_escapes() {
        assert_eq!(symbol("a b"), "a\\ b");
        assert_eq!(symbol("a(b)"), "a\\(b\\)");
        assert_eq!(symbol("a.b"), "a\\.b");
        assert_eq!(symbol("caf\u{e9}"), "caf\\\u{e9}");
        assert_eq!(symbol("white-magic"), "white-magic");
    }

    #[test]
    fn test_quoted() {
        assert_eq!(quoted("a\"b"), "\"a\\\"b\"");
        assert_eq!(quoted("it's"), "\"it\\'s\"");
        assert_eq!(quoted("a\u{1}b"), "\"a\\1b\"");
        // Other control bytes and backslash pass through untouched
        assert_eq!(quoted("a\u{2}\\\n"), "\"a\u{2}\\\n\"");
        assert_eq!(quoted(""), "\"\"");
    }

    #[test]
    fn test_list_and_pair() {
        assert_eq!(list::<_, &str>([]), "()");
        assert_eq!(list(["a", "\"b\"", "3"]), "(a \"b\" 3)");
        assert_eq!(pair("a", "b"), "(a . b)");
        assert_eq!(pair(&quoted("i"), &quoted("r")), "(\"i\" . \"r\")");
    }

    #[test]
    fn test_float_keeps_fraction() {
        assert_eq!(float(1.0), "1.0");
        assert_eq!(float(0.25), "0.25");
        assert_eq!(float(1e20), "100000000000000000000.0");
    }

    #[test]
    fn test_encode_framed_message() {
        let message = Message::new()
            .field("tzcspew", Value::symbol("start"))
            .field("version", Value::string("0"))
            .field("features", Value::list([]));

        let mut encoder = Encoder::new(256);
        let bytes = encoder.encode(&message).to_vec();

        assert_eq!(bytes.first(), Some(&FRAME_START));
        assert_eq!(bytes.last(), Some(&FRAME_END));
        assert_eq!(
            &bytes[1..bytes.len() - 1],
            b"((tzcspew . start) (version . \"0\") (features . ()))"
        );
    }

    #[test]
    fn test_encoder_batches_until_reset() {
        let mut encoder = Encoder::default();
        let a = Message::new().field("a", Value::Integer(1));
        let b = Message::new().field("b", Value::Integer(2));

        let first_len = encoder.encode(&a).len();
        encoder.encode(&b);
        assert!(encoder.len() > first_len);
        assert_eq!(
            encoder.as_bytes(),
            b"\x01((a . 1))\x00\x01((b . 2))\x00".as_slice()
        );

        encoder.reset();
        assert!(encoder.is_empty());
    }

    #[test]
    fn test_empty_message() {
        let mut encoder = Encoder::default();
        assert_eq!(encoder.encode(&Message::new()), b"\x01()\x00".as_slice());
    }
}

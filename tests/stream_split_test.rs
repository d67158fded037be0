//! Stream properties of the codec
//!
//! Chunk boundaries must never change what is decoded, and everything the
//! writer can produce from grammar-constructible values must read back.
//!
//! Usage:
//!   cargo test --test stream_split_test

use proptest::prelude::*;

use szc::protocol::{writer, Decoder, Encoder, Framing, Message, Value};

const CONVERSATION: &[u8] = b"((tzcfodder subscribe) (\"message\" \"*\" \"%me%\"))\n\
((tzcfodder send) (auth . t) (class . \"message\") \
(recipients (\"personal\" . \"kcr\")) (message \"hi \\\"there\\\"\" \"sig\"))\n\
(1 2.5 .75 . stray\\ sym 12ab)\n";

fn decode_whole(input: &[u8], framing: Framing) -> Vec<Value> {
    Decoder::with_framing(framing).feed(input)
}

fn decode_split(input: &[u8], at: usize, framing: Framing) -> Vec<Value> {
    let mut decoder = Decoder::with_framing(framing);
    let mut values = decoder.feed(&input[..at]);
    values.extend(decoder.feed(&input[at..]));
    values
}

#[test]
fn test_split_at_every_offset() {
    let whole = decode_whole(CONVERSATION, Framing::Grammar);
    assert_eq!(whole.len(), 3);

    for at in 0..=CONVERSATION.len() {
        assert_eq!(
            decode_split(CONVERSATION, at, Framing::Grammar),
            whole,
            "split at {at}"
        );
    }
}

#[test]
fn test_framed_output_split_at_every_offset() {
    let mut encoder = Encoder::default();
    encoder.encode(
        &Message::new()
            .field("tzcspew", Value::symbol("message"))
            .field("class", Value::symbol("message"))
            .field("instance", Value::string("it's \"quoted\""))
            .field("port", Value::Integer(32769))
            .field("message", Value::list([Value::string("a"), Value::string("b")])),
    );
    encoder.encode(&Message::new().field("tzcspew", Value::symbol("subscribed")));
    let stream = encoder.as_bytes().to_vec();

    let whole = decode_whole(&stream, Framing::Sentinels);
    assert_eq!(whole.len(), 2);
    assert_eq!(
        whole[1],
        Value::list([Value::list([
            Value::symbol("tzcspew"),
            Value::symbol("subscribed")
        ])])
    );

    for at in 0..=stream.len() {
        assert_eq!(decode_split(&stream, at, Framing::Sentinels), whole, "split at {at}");
    }
}

#[test]
fn test_byte_at_a_time() {
    let mut decoder = Decoder::new();
    let values: Vec<Value> = CONVERSATION
        .iter()
        .filter_map(|&b| decoder.feed_byte(b))
        .collect();
    assert_eq!(values, decode_whole(CONVERSATION, Framing::Grammar));
    assert!(decoder.is_idle());
}

/// Values the grammar can build and the writer renders faithfully:
/// no negative numbers, and strings without backslash or SOH (their
/// escapes do not read back as themselves).
fn grammar_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        "[a-zA-Z!$%&*/:<=>@^_{}~+\\-0-9 ().\"']{0,12}".prop_map(Value::Symbol),
        "[^\\\\\u{1}]{0,16}".prop_map(Value::String),
        (0i64..=i64::MAX).prop_map(Value::Integer),
        (0u32..1_000_000, 0u32..1000)
            .prop_map(|(w, f)| Value::Float(f64::from(w) + f64::from(f) / 1000.0)),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(Value::List)
    })
}

/// `nil` is the one symbol that reads back as something else
fn normalize(value: Value) -> Value {
    match value {
        Value::Symbol(s) if s == "nil" => Value::nil(),
        Value::List(items) => Value::List(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

proptest! {
    #[test]
    fn prop_render_then_decode_round_trips(value in grammar_value()) {
        let mut text = value.render().into_bytes();
        text.push(b' ');
        let decoded = Decoder::new().feed(&text);
        prop_assert_eq!(decoded, vec![normalize(value)]);
    }

    #[test]
    fn prop_chunking_is_invisible(
        values in prop::collection::vec(grammar_value(), 1..4),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let text = writer::list(values.iter().map(Value::render)).into_bytes();

        let mut offsets: Vec<usize> = cuts.iter().map(|c| c.index(text.len() + 1)).collect();
        offsets.sort_unstable();

        let mut decoder = Decoder::new();
        let mut chunked = Vec::new();
        let mut from = 0;
        for at in offsets.into_iter().chain([text.len()]) {
            chunked.extend(decoder.feed(&text[from..at]));
            from = at;
        }

        prop_assert_eq!(chunked, Decoder::new().feed(&text));
        prop_assert!(decoder.is_idle());
    }
}

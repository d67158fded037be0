//! Protocol Layer: Framed S-expression Codec
//!
//! Prinsip desain:
//! - Streaming: decoder menerima potongan byte sembarang ukuran
//! - Forgiving: input rusak tidak pernah fatal
//! - Stateless writer: fungsi render murni, aman dipanggil dari mana saja

mod message;
mod reader;
mod value;
pub mod writer;

pub use message::{Framing, Message, FRAME_END, FRAME_START};
pub use reader::{Decoder, State, Values};
pub use value::Value;
pub use writer::Encoder;

//! Relay boundary
//!
//! Relay = sisi messaging library (subscribe, send, terima notice). Session
//! hanya mengirim form yang sudah di-decode dan menerima `Message` balasan
//! lewat `Outbox`; arti dari tiap perintah urusan relay.

use std::io;

use mio::{Registry, Token};
use tracing::{debug, info};

use crate::error::Result;
use crate::protocol::{Message, Value};

/// One top-level list read from the front-end
#[derive(Debug, Clone, Copy)]
pub struct Command<'a> {
    form: &'a Value,
}

impl<'a> Command<'a> {
    /// Wrap a decoded form; only lists are commands
    pub fn new(form: &'a Value) -> Option<Self> {
        form.as_list().map(|_| Self { form })
    }

    pub fn form(&self) -> &'a Value {
        self.form
    }

    /// `(a b)` head of the form, e.g. `("tzcfodder", "send")`
    pub fn tag(&self) -> Option<(&'a str, &'a str)> {
        self.form.tag()
    }

    /// Everything after the head
    pub fn args(&self) -> &'a [Value] {
        match self.form.as_list() {
            Some([_, rest @ ..]) => rest,
            _ => &[],
        }
    }
}

/// Messages queued for the front-end, flushed by the session
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<Message>,
}

impl Outbox {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.messages.drain(..)
    }
}

/// The messaging side of the session
pub trait Relay {
    /// Identity reported in the start banner
    fn identity(&self) -> Option<String> {
        None
    }

    /// Register the relay's own event source, if it has one
    fn register(&mut self, _registry: &Registry, _token: Token) -> io::Result<()> {
        Ok(())
    }

    /// Act on one command from the front-end
    fn on_command(&mut self, command: Command<'_>, outbox: &mut Outbox) -> Result<()>;

    /// Move events that arrived on the relay side into the outbox
    fn poll_pending(&mut self, _outbox: &mut Outbox) -> Result<()> {
        Ok(())
    }
}

/// Relay that only logs what it is asked to do
#[derive(Debug, Default)]
pub struct TraceRelay {
    commands: u64,
}

impl TraceRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> u64 {
        self.commands
    }
}

impl Relay for TraceRelay {
    fn on_command(&mut self, command: Command<'_>, _outbox: &mut Outbox) -> Result<()> {
        self.commands += 1;
        match command.tag() {
            Some((kind, verb)) => info!(kind, verb, args = command.args().len(), "command"),
            None => info!("untagged command"),
        }
        debug!("form: {}", command.form());
        Ok(())
    }
}

//! Session: readiness loop antara front-end dan relay
//!
//! Menggunakan mio untuk menunggu stdin (dan source milik relay) readable.
//! Decoder tidak pernah blocking; satu-satunya titik tunggu adalah poll.
//!
//! Alur:
//! stdin bytes → Decoder → Command → Relay → Outbox → Encoder → stdout

use std::io::{self, Read, Write};

use tracing::{debug, info, warn};

use super::connection::Connection;
use super::relay::{Command, Outbox, Relay};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::protocol::{Decoder, Encoder, Message, Value};

const STDIN_TOKEN: mio::Token = mio::Token(0);
const RELAY_TOKEN: mio::Token = mio::Token(1);
const SIGNAL_TOKEN: mio::Token = mio::Token(2);
const STDOUT_TOKEN: mio::Token = mio::Token(3);
const EVENTS_CAPACITY: usize = 16;

/// Result of one read/decode/dispatch step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pump {
    /// This many bytes were read and decoded
    Read(usize),
    /// Nothing available right now
    Idle,
    /// Input reached end of stream
    Closed,
}

/// One front-end session
pub struct Session<R, W, L> {
    connection: Connection<R, W>,
    decoder: Decoder,
    encoder: Encoder,
    outbox: Outbox,
    relay: L,
    config: SessionConfig,
}

impl<R: Read, W: Write, L: Relay> Session<R, W, L> {
    pub fn new(reader: R, writer: W, relay: L, config: SessionConfig) -> Self {
        Self {
            connection: Connection::new(
                reader,
                writer,
                config.read_buffer_size,
                config.write_buffer_size,
            ),
            decoder: Decoder::with_framing(config.framing),
            encoder: Encoder::new(config.write_buffer_size),
            outbox: Outbox::default(),
            relay,
            config,
        }
    }

    /// Write the greeting comment and, if enabled, the start banner
    pub fn start(&mut self) -> Result<()> {
        let greeting = format!("; szc {}\n", env!("CARGO_PKG_VERSION"));
        self.connection.queue_write(greeting.as_bytes())?;

        if self.config.banner {
            let identity = self
                .relay
                .identity()
                .or_else(|| self.config.identity.clone())
                .unwrap_or_default();
            self.outbox.push(start_banner(&identity));
        }

        info!("session started");
        self.flush_outbox()
    }

    /// Read what is available, decode it and hand complete commands to the relay
    pub fn pump(&mut self) -> Result<Pump> {
        let available = match self.connection.fill_read_buffer() {
            Ok(n) => n,
            Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(Pump::Closed),
            Err(e) => return Err(e.into()),
        };
        if available == 0 {
            return Ok(Pump::Idle);
        }

        let values = self.decoder.feed(self.connection.readable());
        self.connection.consume(available);

        for value in &values {
            self.dispatch(value);
        }
        self.flush_outbox()?;

        Ok(Pump::Read(available))
    }

    /// Let the relay report events that arrived on its side
    pub fn drain_relay(&mut self) -> Result<()> {
        if let Err(e) = self.relay.poll_pending(&mut self.outbox) {
            warn!(error = %e, "relay failed while polling");
        }
        self.flush_outbox()
    }

    /// Flush anything left and write the closing comment
    ///
    /// Returns only once every queued byte has reached the writer.
    pub fn finish(&mut self) -> Result<()> {
        self.flush_outbox()?;
        self.connection.queue_write(b"; ALL DONE BYE BYE\n")?;
        self.connection.flush_all()?;
        info!("session finished");
        Ok(())
    }

    /// Pump until input closes, without readiness polling
    pub fn run_blocking(&mut self) -> Result<()> {
        self.start()?;
        loop {
            self.drain_relay()?;
            if self.pump()? == Pump::Closed {
                break;
            }
        }
        self.finish()
    }

    fn dispatch(&mut self, value: &Value) {
        debug!("U: {}", value);

        let Some(command) = Command::new(value) else {
            debug!("ignoring non-list form");
            return;
        };
        if let Err(e) = self.relay.on_command(command, &mut self.outbox) {
            warn!(error = %e, "relay failed to handle command");
        }
    }

    /// Encode queued replies and push out as much as the writer accepts
    fn flush_outbox(&mut self) -> Result<()> {
        // Satu frame per baris supaya front-end bisa baca per line
        for message in self.outbox.drain() {
            let frame = self.encoder.encode(&message);
            self.connection.queue_write(frame)?;
            self.connection.queue_write(b"\n")?;
        }
        self.encoder.reset();
        self.connection.flush_write_buffer()?;
        Ok(())
    }

    /// Bytes queued for output that the writer has not accepted yet
    pub fn write_pending(&self) -> usize {
        self.connection.write_pending()
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn relay(&self) -> &L {
        &self.relay
    }

    pub fn into_writer(self) -> W {
        self.connection.into_writer()
    }
}

#[cfg(unix)]
impl<R, W, L> Session<R, W, L>
where
    R: Read + std::os::unix::io::AsRawFd,
    W: Write + std::os::unix::io::AsRawFd,
    L: Relay,
{
    /// Run the readiness loop until the front-end closes its side
    ///
    /// SIGINT and SIGTERM end the loop the same way EOF does, so the
    /// farewell line is still written. Input that cannot be polled (a
    /// regular file) falls back to [`Session::run_blocking`].
    pub fn run(&mut self) -> Result<()> {
        use mio::unix::SourceFd;
        use mio::{Events, Interest, Poll};
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook_mio::v1_0::Signals;

        let fd = self.connection.reader().as_raw_fd();
        let out_fd = self.connection.writer().as_raw_fd();
        let mut poll = Poll::new()?;

        match poll
            .registry()
            .register(&mut SourceFd(&fd), STDIN_TOKEN, Interest::READABLE)
        {
            Ok(()) => {}
            Err(ref e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!("input is not pollable, reading it blocking");
                return self.run_blocking();
            }
            Err(e) => return Err(e.into()),
        }
        // Output yang tidak bisa di-poll juga tidak pernah WouldBlock
        match poll
            .registry()
            .register(&mut SourceFd(&out_fd), STDOUT_TOKEN, Interest::WRITABLE)
        {
            Ok(()) => {}
            Err(ref e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!("output is not pollable");
            }
            Err(e) => return Err(e.into()),
        }

        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        poll.registry()
            .register(&mut signals, SIGNAL_TOKEN, Interest::READABLE)?;
        self.relay.register(poll.registry(), RELAY_TOKEN)?;

        // Edge-triggered: stdin harus di-drain sampai WouldBlock
        let nonblocking = NonBlocking::set(fd)?;
        let mut events = Events::with_capacity(EVENTS_CAPACITY);

        self.start()?;
        'session: loop {
            self.drain_relay()?;

            if let Err(e) = poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            for event in events.iter() {
                match event.token() {
                    STDIN_TOKEN => loop {
                        match self.pump()? {
                            Pump::Read(n) => debug!(bytes = n, "input"),
                            Pump::Idle => break,
                            Pump::Closed => break 'session,
                        }
                    },
                    STDOUT_TOKEN if self.connection.write_pending() > 0 => {
                        self.connection.flush_write_buffer()?;
                    }
                    SIGNAL_TOKEN => {
                        for signal in signals.pending() {
                            info!(signal, "interrupted");
                        }
                        break 'session;
                    }
                    _ => {}
                }
            }
        }

        // Stdin dan stdout bisa berbagi file description (tty), jadi
        // kembalikan mode blocking dulu sebelum output terakhir
        drop(nonblocking);
        self.finish()
    }
}

/// O_NONBLOCK on a descriptor for as long as the guard lives
#[cfg(unix)]
struct NonBlocking {
    fd: std::os::unix::io::RawFd,
    flags: libc::c_int,
}

#[cfg(unix)]
impl NonBlocking {
    fn set(fd: std::os::unix::io::RawFd) -> io::Result<Self> {
        // SAFETY: fcntl on a descriptor we do not close; flags are restored on drop
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { fd, flags })
    }
}

#[cfg(unix)]
impl Drop for NonBlocking {
    fn drop(&mut self) {
        // SAFETY: same descriptor as in `set`, still open; restores the flags read there
        unsafe {
            libc::fcntl(self.fd, libc::F_SETFL, self.flags);
        }
    }
}

/// `((tzcspew . start) ...)` greeting sent before any input is read
pub fn start_banner(identity: &str) -> Message {
    Message::new()
        .field("tzcspew", Value::symbol("start"))
        .field("version", Value::string("0"))
        .field("pid", Value::from(std::process::id()))
        .field("zephyrid", Value::string(identity))
        .field("heartbeat", Value::nil())
        .field("features", Value::list([]))
        .field("exposure", Value::string("NONE"))
        .field("time", Value::string(ctime_now()))
}

/// Local time in the fixed `ctime(3)` layout, e.g. `Thu Oct 15 14:03:09 2026`
#[cfg(unix)]
fn ctime_now() -> String {
    const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    // SAFETY: `tm` is plain data; localtime_r only writes into it and
    // returns null on failure
    let tm = unsafe {
        let now = libc::time(std::ptr::null_mut());
        let mut tm: libc::tm = std::mem::zeroed();
        if libc::localtime_r(&now, &mut tm).is_null() {
            return String::new();
        }
        tm
    };

    format!(
        "{} {} {:>2} {:02}:{:02}:{:02} {}",
        DAYS[tm.tm_wday.rem_euclid(7) as usize],
        MONTHS[tm.tm_mon.rem_euclid(12) as usize],
        tm.tm_mday,
        tm.tm_hour,
        tm.tm_min,
        tm.tm_sec,
        tm.tm_year + 1900
    )
}

#[cfg(not(unix))]
fn ctime_now() -> String {
    String::new()
}

//! szc_dump - decode an S-expression stream and print each value
//!
//! Debug tool untuk melihat apa yang dibaca decoder dari output peer.
//!
//! # Usage
//!
//! ```text
//! szc_dump [--sentinels] [--render] < capture.bin
//! ```
//!
//! # Options
//!
//! - `--sentinels` - Treat SOH/NUL as message boundaries
//! - `--render` - Print canonical text instead of the value tree
//! - `--chunk N` - Read size in bytes (default: 4096)

use std::io::{self, Read, Write};

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use szc::protocol::{Decoder, Framing};

#[derive(Parser)]
#[command(name = "szc_dump")]
#[command(about = "Decode an S-expression stream from stdin")]
struct Args {
    /// Treat SOH/NUL as message boundaries
    #[arg(long)]
    sentinels: bool,

    /// Print canonical text instead of the value tree
    #[arg(long)]
    render: bool,

    /// Read size in bytes
    #[arg(long, default_value_t = 4096)]
    chunk: usize,
}

fn main() -> szc::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let framing = if args.sentinels {
        Framing::Sentinels
    } else {
        Framing::Grammar
    };
    let mut decoder = Decoder::with_framing(framing);
    let mut buf = vec![0u8; args.chunk.max(1)];
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut count = 0u64;

    loop {
        let n = match stdin.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        debug!(bytes = n, "chunk");

        for value in decoder.decode(&buf[..n]) {
            count += 1;
            if args.render {
                writeln!(stdout, "{value}")?;
            } else {
                writeln!(stdout, "{value:?}")?;
            }
        }
    }

    if !decoder.is_idle() {
        warn!(state = ?decoder.state(), depth = decoder.depth(), "input ended mid-value");
    }
    debug!(values = count, "done");
    Ok(())
}

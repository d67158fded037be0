//! szc - S-expression relay front-end
//!
//! Membaca perintah S-expression dari stdin, meneruskannya ke relay, dan
//! menulis balasan sebagai frame SOH/NUL ke stdout.
//!
//! # Usage
//!
//! ```text
//! szc [-v]... [--no-banner] [--grammar-framing] [--identity NAME]
//! ```
//!
//! Ctrl-C (SIGINT) dan SIGTERM menutup session seperti EOF: sisa balasan
//! dan baris `; ALL DONE BYE BYE` tetap ditulis.
//!
//! Log ditulis ke stderr. Default level WARN, tiap `-v` turun satu level;
//! `RUST_LOG` menimpa semuanya.

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use szc::network::{Session, TraceRelay};
use szc::protocol::Framing;
use szc::SessionConfig;

#[derive(Parser)]
#[command(name = "szc")]
#[command(about = "Framed S-expression front-end for a notification relay")]
#[command(version)]
struct Cli {
    /// Increase verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Do not send the start banner
    #[arg(long)]
    no_banner: bool,

    /// Treat SOH/NUL on input as ordinary bytes
    #[arg(long)]
    grammar_framing: bool,

    /// Identity reported in the start banner
    #[arg(long)]
    identity: Option<String>,
}

impl Cli {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            framing: if self.grammar_framing {
                Framing::Grammar
            } else {
                Framing::Sentinels
            },
            banner: !self.no_banner,
            identity: self.identity.clone(),
            ..SessionConfig::default()
        }
    }
}

fn main() -> szc::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(cli.log_level().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut session = Session::new(
        std::io::stdin(),
        std::io::stdout(),
        TraceRelay::new(),
        cli.session_config(),
    );

    #[cfg(unix)]
    session.run()?;
    #[cfg(not(unix))]
    session.run_blocking()?;

    Ok(())
}

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use stbs::frame::{read_frame, Frame, FrameError};

/// Observer for STBS activation notification frames.
///
/// Example:
///   stbs --sink frame | stbs-monitor
#[derive(Debug, Parser)]
#[command(name = "stbs-monitor", about = "Validate and log STBS notification frames")]
struct Cli {
    /// Read frames from this file instead of stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Only accept frames from this device id.
    #[arg(short = 'd', long = "device-id")]
    device_id: Option<u8>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Totals {
    accepted: u64,
    rejected: u64,
    ignored: u64,
}

/// Consume frames until end of input.  Invalid frames are counted and
/// skipped; only transport errors abort.
fn monitor<R: BufRead>(reader: &mut R, device_filter: Option<u8>) -> Result<Totals> {
    let mut totals = Totals::default();
    loop {
        match read_frame(reader) {
            Ok(None) => return Ok(totals),
            Ok(Some(frame)) => {
                if device_filter.is_some_and(|d| d != frame.device_id) {
                    totals.ignored += 1;
                    continue;
                }
                log_frame(&frame);
                totals.accepted += 1;
            }
            Err(FrameError::Io(e)) => return Err(e).context("reading frame stream"),
            Err(e) => {
                warn!(error = %e, "frame rejected");
                totals.rejected += 1;
            }
        }
    }
}

fn log_frame(frame: &Frame) {
    info!(
        device = frame.device_id,
        command = %char::from(frame.command),
        payload = %String::from_utf8_lossy(frame.payload()),
        "activation"
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.input {
        Some(path) => File::open(path)
            .with_context(|| format!("Cannot open input file: {}", path.display()))
            .and_then(|f| monitor(&mut BufReader::new(f), cli.device_id)),
        None => monitor(&mut io::stdin().lock(), cli.device_id),
    };

    match result {
        Ok(t) => info!(
            accepted = t.accepted,
            rejected = t.rejected,
            ignored = t.ignored,
            "end of input"
        ),
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    }
}

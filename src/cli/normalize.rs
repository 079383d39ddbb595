//! Normalize command implementation
//!
//! Replays captured raw frames, one per line, through an exchange adapter
//! and prints the resulting messages as JSON lines.

use crate::config::Config;
use crate::feed::{CoinbaseAdapter, ExchangeAdapter, KrakenAdapter};
use anyhow::Context;
use clap::{Args, ValueEnum};
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Exchange whose wire format the frames use
    #[arg(short, long, value_enum)]
    pub exchange: ExchangeArg,

    /// File of raw frames, one per line (stdin when omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeArg {
    Coinbase,
    Kraken,
}

impl NormalizeArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let adapter: Box<dyn ExchangeAdapter> = match self.exchange {
            ExchangeArg::Coinbase => Box::new(CoinbaseAdapter::new(
                config.coinbase.credentials.clone(),
            )),
            ExchangeArg::Kraken => Box::new(KrakenAdapter::new(config.kraken.pairs.clone())),
        };

        let input: Box<dyn BufRead> = match &self.input {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                Box::new(BufReader::new(file))
            }
            None => Box::new(BufReader::new(std::io::stdin())),
        };

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let summary = replay(adapter.as_ref(), input, &mut out)?;
        out.flush()?;

        eprintln!("{summary}");
        Ok(())
    }
}

/// Outcome counts of a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: usize,
    /// Frames that validated and normalized
    pub accepted: usize,
    /// Frames that were not JSON or failed validation
    pub dropped: usize,
    /// Frames that validated but failed normalization
    pub failed: usize,
    pub messages: usize,
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames={} accepted={} dropped={} failed={} messages={}",
            self.frames, self.accepted, self.dropped, self.failed, self.messages
        )
    }
}

/// Push every line of `input` through `adapter`, writing messages to `out`
///
/// Blank lines are skipped. Bad frames are counted, not fatal; only I/O
/// errors abort the replay.
pub fn replay(
    adapter: &dyn ExchangeAdapter,
    input: impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        summary.frames += 1;

        let frame: Value = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(_) => {
                summary.dropped += 1;
                continue;
            }
        };

        if !adapter.is_valid_frame(&frame) {
            adapter.inspect_control_frame(&frame);
            summary.dropped += 1;
            continue;
        }

        match adapter.normalize(&frame) {
            Ok(messages) => {
                summary.accepted += 1;
                summary.messages += messages.len();
                for message in messages {
                    serde_json::to_writer(&mut *out, &message)?;
                    out.write_all(b"\n")?;
                }
            }
            Err(e) => {
                tracing::warn!(frame = summary.frames, error = %e, "Failed to normalize frame");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

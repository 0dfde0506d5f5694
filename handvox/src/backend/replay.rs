//! Replay backend: drive the pipeline from a recorded JSON-lines session.
//!
//! Frame timestamps come from the recording through a [`ManualClock`], so a
//! replay reproduces hold and debounce timing exactly regardless of how
//! fast the file is read.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::Context;
use tracing::info;

use super::{parse_record, Session};
use crate::interaction::ManualClock;

/// Replay `path` into `session`, printing events and responses to stdout.
pub fn run(session: &mut Session, path: &Path) -> anyhow::Result<()> {
    let file = File::open(path).with_context(|| format!("opening session {}", path.display()))?;
    info!("Replaying session {}", path.display());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    replay_lines(session, BufReader::new(file), &mut out)
}

/// Replay every record from `reader`, writing output lines to `out`.
pub fn replay_lines<R: BufRead, W: Write>(session: &mut Session, reader: R, out: &mut W) -> anyhow::Result<()> {
    let clock = ManualClock::new(0.0);
    let mut records = 0u64;

    for line in reader.lines() {
        let line = line.context("reading session line")?;
        let Some(record) = parse_record(&line) else {
            continue;
        };
        records += 1;
        if let Some(t) = record.time() {
            clock.set(t);
        }
        let emitted = session.handle(record, &clock);
        if let Some(text) = emitted {
            writeln!(out, "{}", text)?;
        }
        if !session.state.running {
            info!("Replay stopped by quit command");
            break;
        }
    }

    info!(
        "Replay finished: {} record(s), {} frame(s), {} stale sample(s), {} voxel(s)",
        records,
        session.state.frames,
        session.state.frame_gate.skipped(),
        session.state.controller.world().len()
    );
    Ok(())
}

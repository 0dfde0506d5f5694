//! Live backend: frame records arrive on stdin from a running detector.
//!
//! Record timestamps are ignored; hold timers run on the local monotonic
//! clock, read once per frame. End of input ends the run.

use std::io::{BufRead, Write};

use anyhow::Context;
use tracing::info;

use super::{parse_record, Session};
use crate::interaction::MonotonicClock;

pub fn run(session: &mut Session) -> anyhow::Result<()> {
    let clock = MonotonicClock::new();
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    info!("Live backend reading frames from stdin");

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let Some(record) = parse_record(&line) else {
            continue;
        };
        let emitted = session.handle(record, &clock);
        if let Some(text) = emitted {
            writeln!(out, "{}", text)?;
            out.flush()?;
        }
        if !session.state.running {
            break;
        }
    }

    info!(
        "Live backend shutting down ({} frame(s), {} voxel(s))",
        session.state.frames,
        session.state.controller.world().len()
    );
    Ok(())
}
